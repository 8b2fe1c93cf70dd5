// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Helpers for testing the registry.

use medallion_base::identifiers::AccountOwner;
use medallion_views::{
    memory::{create_memory_context, MemoryContext},
    views::View,
};

use crate::{
    registry::{CollectionConfig, RegistryView},
    OperationContext,
};

/// A deterministic identity for tests.
pub fn dummy_owner(index: u8) -> AccountOwner {
    AccountOwner::new([index; 32])
}

/// An operation context signed by `owner`.
pub fn signed_by(owner: AccountOwner) -> OperationContext {
    OperationContext {
        authenticated_signer: Some(owner),
    }
}

/// A small collection configuration for tests.
pub fn test_config(max_supply: u64) -> CollectionConfig {
    CollectionConfig {
        name: "Test Collection".to_string(),
        symbol: "TEST".to_string(),
        base_uri: "https://assets.example/item/".to_string(),
        max_supply,
    }
}

/// Creates a registry over a fresh in-memory store, instantiated by `admin`.
pub async fn create_registry(admin: AccountOwner, max_supply: u64) -> RegistryView<MemoryContext<()>> {
    let mut registry = RegistryView::load(create_memory_context())
        .await
        .expect("loading an empty registry should succeed");
    registry
        .instantiate(&signed_by(admin), test_config(max_supply))
        .expect("instantiation should succeed");
    registry
}
