// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use medallion_base::{
    data_types::ArithmeticError,
    ensure,
    identifiers::{AccountOwner, TokenId},
};
use medallion_views::{
    batch::Batch,
    context::Context,
    map_view::MapView,
    register_view::RegisterView,
    set_view::SetView,
    views::{View, ViewError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{OperationContext, RegistryOutcome};

#[cfg(test)]
#[path = "unit_tests/registry_tests.rs"]
mod tests;

/// The configuration of a collection, supplied once at deployment.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Descriptive name of the collection.
    pub name: String,
    /// Short ticker-style symbol.
    pub symbol: String,
    /// Prefix of the per-asset metadata addresses.
    pub base_uri: String,
    /// Ceiling on the number of assets in existence at any time. Must be
    /// positive.
    pub max_supply: u64,
}

/// The collection singleton, fixed at instantiation time.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub symbol: String,
    pub base_uri: String,
    pub max_supply: u64,
    /// The creator, authorized for issuance and for the issuance gate.
    pub admin: AccountOwner,
}

/// The key of the blanket-approval relation.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct OwnerOperator {
    owner: AccountOwner,
    operator: AccountOwner,
}

impl OwnerOperator {
    /// Creates the key for the pair `(owner, operator)`.
    pub fn new(owner: AccountOwner, operator: AccountOwner) -> Self {
        Self { owner, operator }
    }
}

/// An operation that can be submitted to the registry.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Issues the asset `token_id` to `to`. Restricted to the admin.
    Mint {
        to: Option<AccountOwner>,
        token_id: TokenId,
    },
    /// Retires the asset for good. Restricted to the current owner; spend
    /// approvals do not extend to retirement.
    Burn { token_id: TokenId },
    /// Moves the asset from `from` to `to`. The caller must be the owner, the
    /// approved spender, or one of the owner's operators.
    Transfer {
        from: Option<AccountOwner>,
        to: Option<AccountOwner>,
        token_id: TokenId,
    },
    /// Designates `spender` as the one identity allowed to move this asset on
    /// the owner's behalf; `None` revokes the designation.
    Approve {
        spender: Option<AccountOwner>,
        token_id: TokenId,
    },
    /// Grants or withdraws `operator`'s authority over all of the caller's
    /// present and future assets.
    SetApprovalForAll {
        operator: AccountOwner,
        approved: bool,
    },
    /// Closes the issuance gate. Restricted to the admin.
    PauseMinting,
    /// Reopens the issuance gate. Restricted to the admin.
    UnpauseMinting,
}

/// A record appended to the external change log by a successful operation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// The asset changed hands. Issuance reports `from = None`; retirement
    /// reports `to = None`.
    OwnershipChange {
        from: Option<AccountOwner>,
        to: Option<AccountOwner>,
        token_id: TokenId,
    },
    /// The approved spender of the asset was designated or revoked.
    Approval {
        owner: AccountOwner,
        approved: Option<AccountOwner>,
        token_id: TokenId,
    },
    /// A blanket approval was granted or withdrawn.
    ApprovalForAll {
        owner: AccountOwner,
        operator: AccountOwner,
        approved: bool,
    },
}

/// An error rejecting the operation in progress. A rejected operation stages
/// no state change and emits no notification.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    ViewError(#[from] ViewError),
    #[error(transparent)]
    ArithmeticError(#[from] ArithmeticError),

    #[error("The caller is not authorized to perform this operation")]
    Unauthorized,
    #[error("Minting is paused")]
    MintPaused,
    #[error("The recipient is not a valid identity")]
    InvalidRecipient,
    #[error("Asset id {0} is outside the collection's id range")]
    IdOutOfRange(TokenId),
    #[error("Asset {0} already exists or was already retired")]
    AlreadyExists(TokenId),
    #[error("Every asset of the collection has been issued")]
    SupplyExhausted,
    #[error("Asset {0} does not exist")]
    NonexistentAsset(TokenId),
    #[error("Asset {0} is not held by the declared owner")]
    OwnerMismatch(TokenId),
    #[error("An identity cannot be its own operator")]
    SelfOperator,
    #[error("The maximum supply must be a positive number")]
    ZeroMaxSupply,
}

/// Key tags to scope the subviews of the registry on top of the base key.
#[repr(u8)]
enum KeyTag {
    /// Prefix for [`RegistryView::collection`].
    Collection = 0,
    /// Prefix for [`RegistryView::total_supply`].
    TotalSupply,
    /// Prefix for [`RegistryView::mint_paused`].
    MintPaused,
    /// Prefix for [`RegistryView::owners`].
    Owners,
    /// Prefix for [`RegistryView::balances`].
    Balances,
    /// Prefix for [`RegistryView::approved_spenders`].
    ApprovedSpenders,
    /// Prefix for [`RegistryView::operators`].
    Operators,
    /// Prefix for [`RegistryView::retired`].
    Retired,
}

/// A view of the full registry state.
///
/// Ownership, balances, approvals and supply are facets of one container: a
/// transition stages updates across several of them and they are committed in
/// one batch, or not at all.
#[derive(Debug)]
pub struct RegistryView<C> {
    context: C,
    /// The collection singleton. `None` until instantiation.
    pub collection: RegisterView<C, Option<Collection>>,
    /// The number of assets currently in existence.
    pub total_supply: RegisterView<C, u64>,
    /// The gate on issuance.
    pub mint_paused: RegisterView<C, bool>,
    /// The current owner of every existing asset.
    pub owners: MapView<C, TokenId, AccountOwner>,
    /// The number of assets held by each identity. Entries at zero are
    /// removed.
    pub balances: MapView<C, AccountOwner, u64>,
    /// The approved spender of an asset, cleared on every ownership change.
    pub approved_spenders: MapView<C, TokenId, AccountOwner>,
    /// The blanket-approval relation.
    pub operators: SetView<C, OwnerOperator>,
    /// Ids of retired assets. A retired id can never be issued again.
    pub retired: SetView<C, TokenId>,
}

#[async_trait]
impl<C> View<C> for RegistryView<C>
where
    C: Context,
{
    fn context(&self) -> &C {
        &self.context
    }

    async fn load(context: C) -> Result<Self, ViewError> {
        let scope = |tag: KeyTag| context.clone_with_base_key(context.base_tag(tag as u8));
        Ok(Self {
            collection: RegisterView::load(scope(KeyTag::Collection)).await?,
            total_supply: RegisterView::load(scope(KeyTag::TotalSupply)).await?,
            mint_paused: RegisterView::load(scope(KeyTag::MintPaused)).await?,
            owners: MapView::load(scope(KeyTag::Owners)).await?,
            balances: MapView::load(scope(KeyTag::Balances)).await?,
            approved_spenders: MapView::load(scope(KeyTag::ApprovedSpenders)).await?,
            operators: SetView::load(scope(KeyTag::Operators)).await?,
            retired: SetView::load(scope(KeyTag::Retired)).await?,
            context,
        })
    }

    fn rollback(&mut self) {
        self.collection.rollback();
        self.total_supply.rollback();
        self.mint_paused.rollback();
        self.owners.rollback();
        self.balances.rollback();
        self.approved_spenders.rollback();
        self.operators.rollback();
        self.retired.rollback();
    }

    fn flush(&mut self, batch: &mut Batch) -> Result<(), ViewError> {
        self.collection.flush(batch)?;
        self.total_supply.flush(batch)?;
        self.mint_paused.flush(batch)?;
        self.owners.flush(batch)?;
        self.balances.flush(batch)?;
        self.approved_spenders.flush(batch)?;
        self.operators.flush(batch)?;
        self.retired.flush(batch)?;
        Ok(())
    }

    fn delete(self, batch: &mut Batch) {
        batch.delete_key_prefix(self.context.base_key());
    }
}

impl<C> RegistryView<C>
where
    C: Context,
{
    /// Persists all staged changes to the store in one atomic batch write.
    pub async fn save(&mut self) -> Result<(), ViewError> {
        let mut batch = Batch::new();
        self.flush(&mut batch)?;
        self.context.write_batch(batch).await?;
        Ok(())
    }

    /// Creates the collection. The deployment environment calls this exactly
    /// once, before any operation or query reaches the registry; the signer
    /// becomes the admin.
    pub fn instantiate(
        &mut self,
        context: &OperationContext,
        config: CollectionConfig,
    ) -> Result<(), RegistryError> {
        ensure!(config.max_supply > 0, RegistryError::ZeroMaxSupply);
        let admin = context
            .authenticated_signer
            .ok_or(RegistryError::Unauthorized)?;
        assert!(
            self.collection.get().is_none(),
            "the collection is created only once"
        );
        let collection = Collection {
            name: config.name,
            symbol: config.symbol,
            base_uri: config.base_uri,
            max_supply: config.max_supply,
            admin,
        };
        tracing::info!(
            name = %collection.name,
            symbol = %collection.symbol,
            max_supply = collection.max_supply,
            "creating asset collection"
        );
        self.collection.set(Some(collection));
        Ok(())
    }

    /// Executes `operation` on behalf of the signer recorded in `context` and
    /// returns the notifications it emitted.
    pub async fn execute_operation(
        &mut self,
        context: &OperationContext,
        operation: Operation,
    ) -> Result<RegistryOutcome, RegistryError> {
        use Operation::*;
        match operation {
            Mint { to, token_id } => self.mint(context, to, token_id).await,
            Burn { token_id } => self.burn(context, token_id).await,
            Transfer { from, to, token_id } => self.transfer(context, from, to, token_id).await,
            Approve { spender, token_id } => self.approve(context, spender, token_id).await,
            SetApprovalForAll { operator, approved } => {
                self.set_approval_for_all(context, operator, approved)
            }
            PauseMinting => self.set_mint_paused(context, true),
            UnpauseMinting => self.set_mint_paused(context, false),
        }
    }

    /// The collection singleton.
    fn collection(&self) -> &Collection {
        self.collection
            .get()
            .as_ref()
            .expect("the collection is created at deployment")
    }

    /// The descriptive name of the collection.
    pub fn name(&self) -> &str {
        &self.collection().name
    }

    /// The ticker symbol of the collection.
    pub fn symbol(&self) -> &str {
        &self.collection().symbol
    }

    /// The ceiling on the number of assets in existence at any time.
    pub fn max_supply(&self) -> u64 {
        self.collection().max_supply
    }

    /// The number of assets currently in existence.
    pub fn total_supply(&self) -> u64 {
        *self.total_supply.get()
    }

    /// The current owner of the asset.
    pub async fn owner_of(&self, token_id: TokenId) -> Result<AccountOwner, RegistryError> {
        self.owners
            .get(&token_id)
            .await?
            .ok_or(RegistryError::NonexistentAsset(token_id))
    }

    /// The number of assets currently held by `owner`.
    pub async fn balance_of(&self, owner: Option<AccountOwner>) -> Result<u64, RegistryError> {
        let owner = owner.ok_or(RegistryError::InvalidRecipient)?;
        Ok(self.balances.get(&owner).await?.unwrap_or_default())
    }

    /// The approved spender of the asset, if any.
    pub async fn get_approved(
        &self,
        token_id: TokenId,
    ) -> Result<Option<AccountOwner>, RegistryError> {
        ensure!(
            self.owners.get(&token_id).await?.is_some(),
            RegistryError::NonexistentAsset(token_id)
        );
        Ok(self.approved_spenders.get(&token_id).await?)
    }

    /// Whether `operator` may act on all of `owner`'s assets.
    pub async fn is_approved_for_all(
        &self,
        owner: AccountOwner,
        operator: AccountOwner,
    ) -> Result<bool, RegistryError> {
        Ok(self
            .operators
            .contains(&OwnerOperator::new(owner, operator))
            .await?)
    }

    /// Whether `spender` may move the asset: the owner, the approved spender,
    /// or one of the owner's operators. `false` for a nonexistent asset.
    pub async fn is_approved_or_owner(
        &self,
        spender: AccountOwner,
        token_id: TokenId,
    ) -> Result<bool, RegistryError> {
        let Some(owner) = self.owners.get(&token_id).await? else {
            return Ok(false);
        };
        if spender == owner || self.approved_spenders.get(&token_id).await? == Some(spender) {
            return Ok(true);
        }
        self.is_approved_for_all(owner, spender).await
    }

    /// The metadata address of the asset: the collection's base URI followed
    /// by the decimal rendering of the id.
    pub async fn token_uri(&self, token_id: TokenId) -> Result<String, RegistryError> {
        ensure!(
            self.owners.get(&token_id).await?.is_some(),
            RegistryError::NonexistentAsset(token_id)
        );
        Ok(format!("{}{}", self.collection().base_uri, token_id))
    }

    async fn mint(
        &mut self,
        context: &OperationContext,
        to: Option<AccountOwner>,
        token_id: TokenId,
    ) -> Result<RegistryOutcome, RegistryError> {
        let admin = self.collection().admin;
        let max_supply = self.collection().max_supply;
        ensure!(
            context.authenticated_signer == Some(admin),
            RegistryError::Unauthorized
        );
        ensure!(!*self.mint_paused.get(), RegistryError::MintPaused);
        let to = to.ok_or(RegistryError::InvalidRecipient)?;
        ensure!(
            token_id.0 >= 1 && token_id.0 <= max_supply,
            RegistryError::IdOutOfRange(token_id)
        );
        // Ids are single-shot: an id that currently exists or was retired can
        // never be issued (again).
        let never_existed = self.owners.get(&token_id).await?.is_none()
            && !self.retired.contains(&token_id).await?;
        ensure!(never_existed, RegistryError::AlreadyExists(token_id));
        let total_supply = self.total_supply();
        ensure!(total_supply < max_supply, RegistryError::SupplyExhausted);

        self.owners.insert(&token_id, to)?;
        self.credit(&to).await?;
        self.total_supply
            .set(total_supply.checked_add(1).ok_or(ArithmeticError::Overflow)?);
        Ok(
            RegistryOutcome::default().with_event(RegistryEvent::OwnershipChange {
                from: None,
                to: Some(to),
                token_id,
            }),
        )
    }

    async fn burn(
        &mut self,
        context: &OperationContext,
        token_id: TokenId,
    ) -> Result<RegistryOutcome, RegistryError> {
        let owner = self.owner_of(token_id).await?;
        // Retirement authority is owner-exclusive; approved spenders and
        // operators cannot burn.
        ensure!(
            context.authenticated_signer == Some(owner),
            RegistryError::Unauthorized
        );

        self.approved_spenders.remove(&token_id)?;
        self.owners.remove(&token_id)?;
        self.retired.insert(&token_id)?;
        self.debit(&owner).await?;
        self.total_supply.set(
            self.total_supply()
                .checked_sub(1)
                .ok_or(ArithmeticError::Underflow)?,
        );
        Ok(
            RegistryOutcome::default().with_event(RegistryEvent::OwnershipChange {
                from: Some(owner),
                to: None,
                token_id,
            }),
        )
    }

    async fn transfer(
        &mut self,
        context: &OperationContext,
        from: Option<AccountOwner>,
        to: Option<AccountOwner>,
        token_id: TokenId,
    ) -> Result<RegistryOutcome, RegistryError> {
        // The checks run in a fixed order; each one masks all the later ones.
        let owner = self.owner_of(token_id).await?;
        ensure!(from == Some(owner), RegistryError::OwnerMismatch(token_id));
        let caller = context
            .authenticated_signer
            .ok_or(RegistryError::Unauthorized)?;
        ensure!(
            self.is_approved_or_owner(caller, token_id).await?,
            RegistryError::Unauthorized
        );
        let to = to.ok_or(RegistryError::InvalidRecipient)?;

        self.approved_spenders.remove(&token_id)?;
        self.debit(&owner).await?;
        self.credit(&to).await?;
        self.owners.insert(&token_id, to)?;
        Ok(
            RegistryOutcome::default().with_event(RegistryEvent::OwnershipChange {
                from: Some(owner),
                to: Some(to),
                token_id,
            }),
        )
    }

    async fn approve(
        &mut self,
        context: &OperationContext,
        spender: Option<AccountOwner>,
        token_id: TokenId,
    ) -> Result<RegistryOutcome, RegistryError> {
        let owner = self.owner_of(token_id).await?;
        let caller = context
            .authenticated_signer
            .ok_or(RegistryError::Unauthorized)?;
        // Only the owner or one of its operators may change the designation;
        // the currently approved spender may not.
        let authorized = caller == owner || self.is_approved_for_all(owner, caller).await?;
        ensure!(authorized, RegistryError::Unauthorized);

        match spender {
            Some(spender) => self.approved_spenders.insert(&token_id, spender)?,
            None => self.approved_spenders.remove(&token_id)?,
        }
        Ok(RegistryOutcome::default().with_event(RegistryEvent::Approval {
            owner,
            approved: spender,
            token_id,
        }))
    }

    fn set_approval_for_all(
        &mut self,
        context: &OperationContext,
        operator: AccountOwner,
        approved: bool,
    ) -> Result<RegistryOutcome, RegistryError> {
        let caller = context
            .authenticated_signer
            .ok_or(RegistryError::Unauthorized)?;
        ensure!(operator != caller, RegistryError::SelfOperator);
        // The relation is overwritten and the notification emitted regardless
        // of the previous value.
        let relation = OwnerOperator::new(caller, operator);
        if approved {
            self.operators.insert(&relation)?;
        } else {
            self.operators.remove(&relation)?;
        }
        Ok(RegistryOutcome::default().with_event(RegistryEvent::ApprovalForAll {
            owner: caller,
            operator,
            approved,
        }))
    }

    fn set_mint_paused(
        &mut self,
        context: &OperationContext,
        paused: bool,
    ) -> Result<RegistryOutcome, RegistryError> {
        ensure!(
            context.authenticated_signer == Some(self.collection().admin),
            RegistryError::Unauthorized
        );
        tracing::info!(collection = %self.name(), paused, "setting the issuance gate");
        self.mint_paused.set(paused);
        Ok(RegistryOutcome::default())
    }

    async fn credit(&mut self, owner: &AccountOwner) -> Result<(), RegistryError> {
        let balance = self.balances.get_mut_or_default(owner).await?;
        *balance = balance.checked_add(1).ok_or(ArithmeticError::Overflow)?;
        Ok(())
    }

    async fn debit(&mut self, owner: &AccountOwner) -> Result<(), RegistryError> {
        let balance = self.balances.get_mut_or_default(owner).await?;
        *balance = balance.checked_sub(1).ok_or(ArithmeticError::Underflow)?;
        if *balance == 0 {
            self.balances.remove(owner)?;
        }
        Ok(())
    }
}
