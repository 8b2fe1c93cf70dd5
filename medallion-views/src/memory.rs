// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{collections::BTreeMap, ops::Bound, sync::Arc};

use async_lock::RwLock;
use async_trait::async_trait;
use thiserror::Error;

use crate::{
    batch::{Batch, WriteOperation},
    context::{ContextFromStore, KeyValueStore},
    views::ViewError,
};

/// The data is serialized in memory just like persistent backends keep it on
/// disk; the analog of the database is the ordered map.
pub type MemoryStoreMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// A virtual store where data is persisted in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// The map storing the data.
    map: Arc<RwLock<MemoryStoreMap>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Returns the range of keys starting with `key_prefix`.
pub(crate) fn get_interval(key_prefix: Vec<u8>) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let mut upper = key_prefix.clone();
    let mut upper_bound = Bound::Unbounded;
    while let Some(last) = upper.pop() {
        if last < u8::MAX {
            upper.push(last + 1);
            upper_bound = Bound::Excluded(upper);
            break;
        }
    }
    (Bound::Included(key_prefix), upper_bound)
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    type Error = MemoryStoreError;

    async fn read_value_bytes(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MemoryStoreError> {
        let map = self.map.read().await;
        Ok(map.get(key).cloned())
    }

    async fn find_keys_by_prefix(
        &self,
        key_prefix: &[u8],
    ) -> Result<Vec<Vec<u8>>, MemoryStoreError> {
        let map = self.map.read().await;
        let len = key_prefix.len();
        Ok(map
            .range(get_interval(key_prefix.to_vec()))
            .map(|(key, _value)| key[len..].to_vec())
            .collect())
    }

    async fn write_batch(&self, batch: Batch) -> Result<(), MemoryStoreError> {
        // A single write guard makes the whole batch atomic with respect to
        // concurrent readers.
        let mut map = self.map.write().await;
        for operation in batch.operations {
            match operation {
                WriteOperation::Put { key, value } => {
                    map.insert(key, value);
                }
                WriteOperation::Delete { key } => {
                    map.remove(&key);
                }
                WriteOperation::DeletePrefix { key_prefix } => {
                    let keys = map
                        .range(get_interval(key_prefix))
                        .map(|(key, _value)| key.clone())
                        .collect::<Vec<_>>();
                    for key in keys {
                        map.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}

/// An implementation of [`crate::context::Context`] that stores all values in
/// memory.
pub type MemoryContext<E> = ContextFromStore<E, MemoryStore>;

/// Provides a `MemoryContext<()>` that can be used for tests.
pub fn create_memory_context() -> MemoryContext<()> {
    ContextFromStore::new(MemoryStore::new(), ())
}

/// The error type of [`MemoryStore`].
#[derive(Error, Debug)]
pub enum MemoryStoreError {
    /// Serialization error with BCS.
    #[error("BCS error: {0}")]
    Bcs(#[from] bcs::Error),
}

impl From<MemoryStoreError> for ViewError {
    fn from(error: MemoryStoreError) -> Self {
        ViewError::StoreError {
            backend: "memory".to_string(),
            error: error.to_string(),
        }
    }
}
