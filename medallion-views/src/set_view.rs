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

/// Key tags to create the sub-keys of a SetView on top of the base key.
#[repr(u8)]
enum KeyTag {
    /// Prefix for the members of the set.
    Index = 0,
}

/// A view that tracks membership of a set of values.
#[derive(Debug)]
pub struct SetView<C, I> {
    context: C,
    updates: BTreeMap<Vec<u8>, Update<()>>,
    _phantom: PhantomData<I>,
}

#[async_trait]
impl<C, I> View<C> for SetView<C, I>
where
    C: Context,
    I: Send + Sync,
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
                Update::Set(()) => batch.put_key_value_bytes(key, Vec::new()),
            }
        }
        Ok(())
    }

    fn delete(self, batch: &mut Batch) {
        batch.delete_key_prefix(self.context.base_key());
    }
}

impl<C, I> SetView<C, I>
where
    C: Context,
    I: Serialize,
{
    /// Stages the insertion of a member. Inserting an existing member has no
    /// effect.
    pub fn insert(&mut self, index: &I) -> Result<(), ViewError> {
        let short_key = C::derive_short_key(index)?;
        self.updates.insert(short_key, Update::Set(()));
        Ok(())
    }

    /// Stages the removal of a member. Removing an absent member has no
    /// effect.
    pub fn remove(&mut self, index: &I) -> Result<(), ViewError> {
        let short_key = C::derive_short_key(index)?;
        self.updates.insert(short_key, Update::Removed);
        Ok(())
    }

    /// Returns true if the given index is a member of the set. Staged updates
    /// shadow the store.
    pub async fn contains(&self, index: &I) -> Result<bool, ViewError> {
        let short_key = C::derive_short_key(index)?;
        if let Some(update) = self.updates.get(&short_key) {
            return Ok(matches!(update, Update::Set(())));
        }
        let key = self.context.base_tag_index(KeyTag::Index as u8, &short_key);
        Ok(self.context.read_key_bytes(&key).await?.is_some())
    }

    /// Obtains the extra data.
    pub fn extra(&self) -> &C::Extra {
        self.context.extra()
    }
}

impl<C, I> SetView<C, I>
where
    C: Context,
    I: Serialize + DeserializeOwned + Send,
{
    /// Returns the list of members of the set, in the order of their
    /// serialization.
    pub async fn indices(&self) -> Result<Vec<I>, ViewError> {
        let base = self.context.base_tag(KeyTag::Index as u8);
        let mut short_keys: BTreeSet<Vec<u8>> = self
            .context
            .find_keys_by_prefix(&base)
            .await?
            .into_iter()
            .collect();
        for (short_key, update) in &self.updates {
            match update {
                Update::Set(()) => {
                    short_keys.insert(short_key.clone());
                }
                Update::Removed => {
                    short_keys.remove(short_key);
                }
            }
        }
        short_keys
            .iter()
            .map(|key| C::deserialize_value(key))
            .collect()
    }
}
