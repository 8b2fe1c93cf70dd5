// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    batch::Batch,
    context::Context,
    views::{View, ViewError},
};

/// Key tags to create the sub-keys of a RegisterView on top of the base key.
#[repr(u8)]
enum KeyTag {
    /// Prefix for the stored value.
    Value = 0,
}

/// A view holding a single value of type `T`.
#[derive(Debug)]
pub struct RegisterView<C, T> {
    context: C,
    stored_value: Box<T>,
    update: Option<Box<T>>,
}

#[async_trait]
impl<C, T> View<C> for RegisterView<C, T>
where
    C: Context,
    T: Default + Send + Sync + Serialize + DeserializeOwned,
{
    fn context(&self) -> &C {
        &self.context
    }

    async fn load(context: C) -> Result<Self, ViewError> {
        let key = context.base_tag(KeyTag::Value as u8);
        let stored_value = Box::new(context.read_key(&key).await?.unwrap_or_default());
        Ok(Self {
            context,
            stored_value,
            update: None,
        })
    }

    fn rollback(&mut self) {
        self.update = None;
    }

    fn flush(&mut self, batch: &mut Batch) -> Result<(), ViewError> {
        if let Some(value) = self.update.take() {
            let key = self.context.base_tag(KeyTag::Value as u8);
            batch.put_key_value(key, &value)?;
            self.stored_value = value;
        }
        Ok(())
    }

    fn delete(self, batch: &mut Batch) {
        batch.delete_key_prefix(self.context.base_key());
    }
}

impl<C, T> RegisterView<C, T>
where
    C: Context,
{
    /// Reads the current value of the register.
    pub fn get(&self) -> &T {
        match &self.update {
            None => &self.stored_value,
            Some(value) => value,
        }
    }

    /// Stages a new value for the register.
    pub fn set(&mut self, value: T) {
        self.update = Some(Box::new(value));
    }

    /// Obtains the extra data.
    pub fn extra(&self) -> &C::Extra {
        self.context.extra()
    }
}
