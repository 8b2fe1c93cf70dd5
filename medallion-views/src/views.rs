// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use thiserror::Error;

use crate::batch::Batch;

/// A view gives exclusive access to read and write the data stored under a
/// base key of the underlying store.
#[async_trait]
pub trait View<C>: Sized {
    /// Obtains the context of the view.
    fn context(&self) -> &C;

    /// Creates the view from the data stored under the context's base key.
    async fn load(context: C) -> Result<Self, ViewError>;

    /// Discards all staged changes.
    fn rollback(&mut self);

    /// Translates the staged changes into write operations appended to
    /// `batch`. The view stays usable afterwards. Staged changes of a view
    /// dropped without flushing are simply lost.
    fn flush(&mut self, batch: &mut Batch) -> Result<(), ViewError>;

    /// Instead of persisting changes, removes all the data that belongs to
    /// this view. The view is consumed.
    fn delete(self, batch: &mut Batch);
}

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum ViewError {
    /// A stored value could not be serialized or deserialized.
    #[error("failed to serialize or deserialize a stored value")]
    Serialization(#[from] bcs::Error),

    /// The backing store failed.
    #[error("storage operation error in {backend}: {error}")]
    StoreError {
        /// The name of the backend.
        backend: String,
        /// The underlying error.
        error: String,
    },
}

/// A staged update to a stored entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Update<T> {
    /// The entry is slated for removal.
    Removed,
    /// The entry is slated to hold this value.
    Set(T),
}
