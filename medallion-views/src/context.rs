// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{batch::Batch, views::ViewError};

/// Low-level, asynchronous key-value operations exposed by a storage backend.
#[async_trait]
pub trait KeyValueStore: Clone + Send + Sync {
    /// The error type produced by the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the value stored under `key`, if any.
    async fn read_value_bytes(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Returns the keys starting with `key_prefix`, with the prefix stripped,
    /// in lexicographic order.
    async fn find_keys_by_prefix(&self, key_prefix: &[u8]) -> Result<Vec<Vec<u8>>, Self::Error>;

    /// Applies all the operations of `batch`, atomically.
    async fn write_batch(&self, batch: Batch) -> Result<(), Self::Error>;
}

/// Access to a scoped region of a key-value store, together with the value
/// encoding used by views.
#[async_trait]
pub trait Context: Clone + Send + Sync {
    /// User-provided data attached to the context.
    type Extra: Send + Sync;

    /// Obtains the extra data.
    fn extra(&self) -> &Self::Extra;

    /// The key prefix owned by this context.
    fn base_key(&self) -> Vec<u8>;

    /// The base key extended with a tag byte.
    fn base_tag(&self, tag: u8) -> Vec<u8> {
        let mut key = self.base_key();
        key.push(tag);
        key
    }

    /// The base key extended with a tag byte and a serialized index.
    fn base_tag_index(&self, tag: u8, index: &[u8]) -> Vec<u8> {
        let mut key = self.base_tag(tag);
        key.extend_from_slice(index);
        key
    }

    /// Serializes an index into the suffix of a key.
    fn derive_short_key<I>(index: &I) -> Result<Vec<u8>, ViewError>
    where
        I: Serialize + ?Sized,
    {
        Ok(bcs::to_bytes(index)?)
    }

    /// The key of `index` under the given tag.
    fn derive_tag_key<I>(&self, tag: u8, index: &I) -> Result<Vec<u8>, ViewError>
    where
        I: Serialize + ?Sized,
    {
        let mut key = self.base_tag(tag);
        bcs::serialize_into(&mut key, index)?;
        Ok(key)
    }

    /// Deserializes a stored value or key suffix.
    fn deserialize_value<Item: DeserializeOwned>(bytes: &[u8]) -> Result<Item, ViewError> {
        Ok(bcs::from_bytes(bytes)?)
    }

    /// Reads the raw bytes stored under `key`, if any.
    async fn read_key_bytes(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ViewError>;

    /// Reads and deserializes the value stored under `key`, if any.
    async fn read_key<Item>(&self, key: &[u8]) -> Result<Option<Item>, ViewError>
    where
        Item: DeserializeOwned + Send,
    {
        match self.read_key_bytes(key).await? {
            None => Ok(None),
            Some(bytes) => Ok(Some(Self::deserialize_value(&bytes)?)),
        }
    }

    /// Returns the keys starting with `key_prefix`, with the prefix stripped,
    /// in lexicographic order.
    async fn find_keys_by_prefix(&self, key_prefix: &[u8]) -> Result<Vec<Vec<u8>>, ViewError>;

    /// Applies all the operations of `batch`, atomically.
    async fn write_batch(&self, batch: Batch) -> Result<(), ViewError>;

    /// Creates a context on the same store rooted at another base key.
    fn clone_with_base_key(&self, base_key: Vec<u8>) -> Self;
}

/// An implementation of [`Context`] from a store and a base key.
#[derive(Clone, Debug)]
pub struct ContextFromStore<E, S> {
    /// The store used for persisting the data.
    pub store: S,
    /// The key prefix owned by this context.
    pub base_key: Vec<u8>,
    /// User-provided data.
    pub extra: E,
}

impl<E, S> ContextFromStore<E, S> {
    /// Creates a context rooted at the empty base key.
    pub fn new(store: S, extra: E) -> Self {
        Self {
            store,
            base_key: Vec::new(),
            extra,
        }
    }
}

#[async_trait]
impl<E, S> Context for ContextFromStore<E, S>
where
    E: Clone + Send + Sync,
    S: KeyValueStore,
    ViewError: From<S::Error>,
{
    type Extra = E;

    fn extra(&self) -> &E {
        &self.extra
    }

    fn base_key(&self) -> Vec<u8> {
        self.base_key.clone()
    }

    async fn read_key_bytes(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ViewError> {
        Ok(self.store.read_value_bytes(key).await?)
    }

    async fn find_keys_by_prefix(&self, key_prefix: &[u8]) -> Result<Vec<Vec<u8>>, ViewError> {
        Ok(self.store.find_keys_by_prefix(key_prefix).await?)
    }

    async fn write_batch(&self, batch: Batch) -> Result<(), ViewError> {
        self.store.write_batch(batch).await?;
        Ok(())
    }

    fn clone_with_base_key(&self, base_key: Vec<u8>) -> Self {
        Self {
            store: self.store.clone(),
            base_key,
            extra: self.extra.clone(),
        }
    }
}
