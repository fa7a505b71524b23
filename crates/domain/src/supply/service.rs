//! Supply service providing the supply lifecycle operations.

use common::{AggregateId, ProfileId};
use event_store::{EventStore, EventStoreError};

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    CloseSupply, OpenNewSupply, OpenSupply, ReconcileSupplyTotal, Supply, SupplyError,
    SupplyIdentifier, open_supply_claim,
};

/// Service for managing supplies.
///
/// Wraps the command handler. The one-open-supply-per-profile rule is checked
/// up front and enforced again by the store through the open-supply claim.
pub struct SupplyService<S: EventStore> {
    handler: CommandHandler<S, Supply>,
}

impl<S: EventStore> SupplyService<S> {
    /// Creates a new supply service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Supply> {
        &self.handler
    }

    /// Loads a supply, returning None if it doesn't exist.
    pub async fn find(&self, supply_id: AggregateId) -> Result<Option<Supply>, DomainError> {
        self.handler.load_existing(supply_id).await
    }

    /// The profile's New or Open supply, if any.
    #[tracing::instrument(skip(self))]
    pub async fn active_for(&self, profile: ProfileId) -> Result<Option<Supply>, DomainError> {
        let holder = self
            .handler
            .store()
            .claim_holder(&open_supply_claim(profile))
            .await?;

        match holder {
            Some(supply_id) => Ok(self
                .handler
                .load_existing(supply_id)
                .await?
                .filter(Supply::is_active)),
            None => Ok(None),
        }
    }

    /// Opens a new supply for the profile.
    ///
    /// Fails with `AlreadyOpen` if the profile already has a New or Open supply.
    #[tracing::instrument(skip(self))]
    pub async fn open_new(&self, cmd: OpenNewSupply) -> Result<CommandResult<Supply>, DomainError> {
        let profile = cmd.profile;

        if let Some(existing) = self.active_for(profile).await?
            && let Some(supply) = existing.id()
        {
            return Err(SupplyError::AlreadyOpen { profile, supply }.into());
        }

        let supply_id = cmd.supply_id;
        let identifier = SupplyIdentifier::generate();

        let result = self
            .handler
            .execute(supply_id, |supply| {
                supply.create(supply_id, profile, identifier)
            })
            .await
            .map_err(|e| match e {
                DomainError::EventStore(EventStoreError::ClaimConflict { holder, .. }) => {
                    SupplyError::AlreadyOpen {
                        profile,
                        supply: holder,
                    }
                    .into()
                }
                other => other,
            })?;

        if let Some(identifier) = result.aggregate.identifier() {
            tracing::info!(%supply_id, %identifier, "supply opened");
        }
        Ok(result)
    }

    /// Moves a New supply to Open.
    #[tracing::instrument(skip(self))]
    pub async fn open(&self, cmd: OpenSupply) -> Result<CommandResult<Supply>, DomainError> {
        self.handler
            .execute(cmd.supply_id, |supply| supply.open())
            .await
    }

    /// Closes a supply, releasing the profile's open-supply claim.
    #[tracing::instrument(skip(self))]
    pub async fn close(&self, cmd: CloseSupply) -> Result<CommandResult<Supply>, DomainError> {
        let result = self
            .handler
            .execute(cmd.supply_id, |supply| supply.close())
            .await?;

        tracing::info!(supply_id = %cmd.supply_id, total = result.aggregate.total(), "supply closed");
        Ok(result)
    }

    /// Records a recomputed order-line count.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_total(
        &self,
        cmd: ReconcileSupplyTotal,
    ) -> Result<CommandResult<Supply>, DomainError> {
        let total = cmd.total;

        self.handler
            .execute(cmd.supply_id, |supply| supply.reconcile_total(total))
            .await
    }
}
