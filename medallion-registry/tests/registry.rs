// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use assert_matches::assert_matches;
use medallion_base::identifiers::TokenId;
use medallion_registry::{
    test_utils::{dummy_owner, signed_by, test_config},
    Operation, RegistryError, RegistryEvent, RegistryView,
};
use medallion_views::{memory::create_memory_context, views::View};

#[test_log::test(tokio::test)]
async fn saved_state_survives_a_reload() -> anyhow::Result<()> {
    let admin = dummy_owner(1);
    let alice = dummy_owner(2);
    let bob = dummy_owner(3);
    let context = create_memory_context();

    let mut registry = RegistryView::load(context.clone()).await?;
    registry.instantiate(&signed_by(admin), test_config(10))?;
    registry
        .execute_operation(
            &signed_by(admin),
            Operation::Mint {
                to: Some(alice),
                token_id: TokenId(1),
            },
        )
        .await?;
    registry
        .execute_operation(
            &signed_by(alice),
            Operation::Approve {
                spender: Some(bob),
                token_id: TokenId(1),
            },
        )
        .await?;
    registry.save().await?;
    drop(registry);

    let registry = RegistryView::load(context).await?;
    assert_eq!(registry.name(), "Test Collection");
    assert_eq!(registry.total_supply(), 1);
    assert_eq!(registry.owner_of(TokenId(1)).await?, alice);
    assert_eq!(registry.get_approved(TokenId(1)).await?, Some(bob));
    assert_eq!(registry.balance_of(Some(alice)).await?, 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn rejected_operations_commit_nothing() -> anyhow::Result<()> {
    let admin = dummy_owner(1);
    let alice = dummy_owner(2);
    let mallory = dummy_owner(5);
    let context = create_memory_context();

    let mut registry = RegistryView::load(context.clone()).await?;
    registry.instantiate(&signed_by(admin), test_config(10))?;
    registry
        .execute_operation(
            &signed_by(admin),
            Operation::Mint {
                to: Some(alice),
                token_id: TokenId(1),
            },
        )
        .await?;
    registry.save().await?;

    let result = registry
        .execute_operation(
            &signed_by(mallory),
            Operation::Transfer {
                from: Some(alice),
                to: Some(mallory),
                token_id: TokenId(1),
            },
        )
        .await;
    assert_matches!(result, Err(RegistryError::Unauthorized));
    registry.save().await?;

    let registry = RegistryView::load(context).await?;
    assert_eq!(registry.owner_of(TokenId(1)).await?, alice);
    assert_eq!(registry.balance_of(Some(mallory)).await?, 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn rollback_discards_an_unsaved_operation() -> anyhow::Result<()> {
    let admin = dummy_owner(1);
    let alice = dummy_owner(2);
    let context = create_memory_context();

    let mut registry = RegistryView::load(context.clone()).await?;
    registry.instantiate(&signed_by(admin), test_config(10))?;
    registry.save().await?;

    registry
        .execute_operation(
            &signed_by(admin),
            Operation::Mint {
                to: Some(alice),
                token_id: TokenId(1),
            },
        )
        .await?;
    assert_eq!(registry.total_supply(), 1);

    registry.rollback();
    assert_eq!(registry.total_supply(), 0);
    assert_matches!(
        registry.owner_of(TokenId(1)).await,
        Err(RegistryError::NonexistentAsset(TokenId(1)))
    );

    registry.save().await?;
    let registry = RegistryView::load(context).await?;
    assert_eq!(registry.total_supply(), 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn the_outcomes_form_a_change_log() -> anyhow::Result<()> {
    let admin = dummy_owner(1);
    let alice = dummy_owner(2);
    let bob = dummy_owner(3);
    let context = create_memory_context();

    let mut registry = RegistryView::load(context).await?;
    registry.instantiate(&signed_by(admin), test_config(10))?;

    let mut log = Vec::new();
    for (context, operation) in [
        (
            signed_by(admin),
            Operation::Mint {
                to: Some(alice),
                token_id: TokenId(1),
            },
        ),
        (
            signed_by(alice),
            Operation::SetApprovalForAll {
                operator: bob,
                approved: true,
            },
        ),
        (
            signed_by(bob),
            Operation::Transfer {
                from: Some(alice),
                to: Some(bob),
                token_id: TokenId(1),
            },
        ),
        (signed_by(bob), Operation::Burn { token_id: TokenId(1) }),
    ] {
        let outcome = registry.execute_operation(&context, operation).await?;
        log.extend(outcome.events);
    }

    assert_eq!(
        log,
        vec![
            RegistryEvent::OwnershipChange {
                from: None,
                to: Some(alice),
                token_id: TokenId(1),
            },
            RegistryEvent::ApprovalForAll {
                owner: alice,
                operator: bob,
                approved: true,
            },
            RegistryEvent::OwnershipChange {
                from: Some(alice),
                to: Some(bob),
                token_id: TokenId(1),
            },
            RegistryEvent::OwnershipChange {
                from: Some(bob),
                to: None,
                token_id: TokenId(1),
            },
        ]
    );
    Ok(())
}
