// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use crate::views::ViewError;

/// A single write inside a batch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WriteOperation {
    /// Removes the entry under `key`.
    Delete {
        /// The key of the entry.
        key: Vec<u8>,
    },
    /// Removes every entry whose key starts with `key_prefix`.
    DeletePrefix {
        /// The common prefix of the removed entries.
        key_prefix: Vec<u8>,
    },
    /// Stores `value` under `key`.
    Put {
        /// The key of the entry.
        key: Vec<u8>,
        /// The serialized value.
        value: Vec<u8>,
    },
}

/// An ordered set of write operations applied to the store all at once or not
/// at all. A key may appear several times; later operations win.
#[derive(Default, Debug)]
pub struct Batch {
    /// The write operations, in application order.
    pub operations: Vec<WriteOperation>,
}

impl Batch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the batch contains no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Appends the serialization of `value` under `key`.
    pub fn put_key_value(&mut self, key: Vec<u8>, value: &impl Serialize) -> Result<(), ViewError> {
        let bytes = bcs::to_bytes(value)?;
        self.put_key_value_bytes(key, bytes);
        Ok(())
    }

    /// Appends raw `value` bytes under `key`.
    pub fn put_key_value_bytes(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.operations.push(WriteOperation::Put { key, value });
    }

    /// Appends the deletion of `key`.
    pub fn delete_key(&mut self, key: Vec<u8>) {
        self.operations.push(WriteOperation::Delete { key });
    }

    /// Appends the deletion of all keys starting with `key_prefix`.
    pub fn delete_key_prefix(&mut self, key_prefix: Vec<u8>) {
        self.operations.push(WriteOperation::DeletePrefix { key_prefix });
    }
}
