// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::{BTreeMap, BTreeSet},
    marker::PhantomData,
    mem,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    batch::Batch,
    context::Context,
    views::{Update, View, ViewError},
};

/// Key tags to create the sub-keys of a MapView on top of the base key.
#[repr(u8)]
enum KeyTag {
    /// Prefix for the indices of the map.
    Index = 0,
}

/// A view that supports inserting and removing values indexed by a key.
#[derive(Debug)]
pub struct MapView<C, I, V> {
    context: C,
    updates: BTreeMap<Vec<u8>, Update<V>>,
    _phantom: PhantomData<I>,
}

#[async_trait]
impl<C, I, V> View<C> for MapView<C, I, V>
where
    C: Context,
    I: Send + Sync,
    V: Clone + Send + Sync + Serialize,
{
    fn context(&self) -> &C {
        &self.context
    }

    async fn load(context: C) -> Result<Self, ViewError> {
        Ok(Self {
            context,
            updates: BTreeMap::new(),
            _phantom: PhantomData,
        })
    }

    fn rollback(&mut self) {
        self.updates.clear();
    }

    fn flush(&mut self, batch: &mut Batch) -> Result<(), ViewError> {
        for (index, update) in mem::take(&mut self.updates) {
            let key = self.context.base_tag_index(KeyTag::Index as u8, &index);
            match update {
                Update::Removed => batch.delete_key(key),
                Update::Set(value) => batch.put_key_value(key, &value)?,
            }
        }
        Ok(())
    }

    fn delete(self, batch: &mut Batch) {
        batch.delete_key_prefix(self.context.base_key());
    }
}

impl<C, I, V> MapView<C, I, V>
where
    C: Context,
    I: Serialize,
{
    /// Stages an insertion, overwriting any current value.
    pub fn insert(&mut self, index: &I, value: V) -> Result<(), ViewError> {
        let short_key = C::derive_short_key(index)?;
        self.updates.insert(short_key, Update::Set(value));
        Ok(())
    }

    /// Stages the removal of an entry. Removing an absent entry has no
    /// effect.
    pub fn remove(&mut self, index: &I) -> Result<(), ViewError> {
        let short_key = C::derive_short_key(index)?;
        self.updates.insert(short_key, Update::Removed);
        Ok(())
    }

    /// Obtains the extra data.
    pub fn extra(&self) -> &C::Extra {
        self.context.extra()
    }
}

impl<C, I, V> MapView<C, I, V>
where
    C: Context,
    I: Serialize,
    V: Clone + Send + Serialize + DeserializeOwned,
{
    /// Reads the value at the given position, if any. Staged updates shadow
    /// the store.
    pub async fn get(&self, index: &I) -> Result<Option<V>, ViewError> {
        let short_key = C::derive_short_key(index)?;
        if let Some(update) = self.updates.get(&short_key) {
            let value = match update {
                Update::Removed => None,
                Update::Set(value) => Some(value.clone()),
            };
            return Ok(value);
        }
        let key = self.context.derive_tag_key(KeyTag::Index as u8, index)?;
        self.context.read_key(&key).await
    }
}

impl<C, I, V> MapView<C, I, V>
where
    C: Context,
    I: Serialize,
    V: Clone + Default + Send + Serialize + DeserializeOwned,
{
    /// Obtains a mutable reference to the value at the given position,
    /// staging the default value if the entry is missing.
    pub async fn get_mut_or_default(&mut self, index: &I) -> Result<&mut V, ViewError> {
        let short_key = C::derive_short_key(index)?;
        let value = match self.updates.remove(&short_key) {
            Some(Update::Set(value)) => value,
            Some(Update::Removed) => V::default(),
            None => {
                let key = self.context.derive_tag_key(KeyTag::Index as u8, index)?;
                self.context.read_key(&key).await?.unwrap_or_default()
            }
        };
        match self.updates.entry(short_key).or_insert(Update::Set(value)) {
            Update::Set(value) => Ok(value),
            // The entry was just inserted as `Set`.
            Update::Removed => unreachable!(),
        }
    }
}

impl<C, I, V> MapView<C, I, V>
where
    C: Context,
    I: Serialize + DeserializeOwned + Send,
    V: Clone + Send + Serialize + DeserializeOwned,
{
    /// Returns the list of indices of the map, in the order of their
    /// serialization.
    pub async fn indices(&self) -> Result<Vec<I>, ViewError> {
        self.short_keys()
            .await?
            .iter()
            .map(|key| C::deserialize_value(key))
            .collect()
    }

    /// The serialized indices present in the map, merging the staged updates
    /// over the stored entries.
    async fn short_keys(&self) -> Result<BTreeSet<Vec<u8>>, ViewError> {
        let base = self.context.base_tag(KeyTag::Index as u8);
        let mut short_keys: BTreeSet<Vec<u8>> = self
            .context
            .find_keys_by_prefix(&base)
            .await?
            .into_iter()
            .collect();
        for (short_key, update) in &self.updates {
            match update {
                Update::Set(_) => {
                    short_keys.insert(short_key.clone());
                }
                Update::Removed => {
                    short_keys.remove(short_key);
                }
            }
        }
        Ok(short_keys)
    }
}
