//! Package service providing a simplified API for package operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{ChangeOrderStatus, MarkPackagePrinted, PackOrders, Package};

/// Service for managing packages.
pub struct PackageService<S: EventStore> {
    handler: CommandHandler<S, Package>,
}

impl<S: EventStore> PackageService<S> {
    /// Creates a new package service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Package> {
        &self.handler
    }

    /// Loads a package, returning None if it doesn't exist.
    pub async fn find(&self, package_id: AggregateId) -> Result<Option<Package>, DomainError> {
        self.handler.load_existing(package_id).await
    }

    /// Persists a new package as its first event.
    #[tracing::instrument(skip(self, cmd), fields(package_id = %cmd.package_id, supply_id = %cmd.supply, lines = cmd.orders.len()))]
    pub async fn pack(&self, cmd: PackOrders) -> Result<CommandResult<Package>, DomainError> {
        let PackOrders {
            package_id,
            profile,
            supply,
            orders,
        } = cmd;

        self.handler
            .execute(package_id, |package| {
                package.pack(package_id, profile, supply, orders)
            })
            .await
    }

    /// Sets the print flag of a package.
    #[tracing::instrument(skip(self))]
    pub async fn mark_printed(
        &self,
        cmd: MarkPackagePrinted,
    ) -> Result<CommandResult<Package>, DomainError> {
        self.handler
            .execute(cmd.package_id, |package| package.mark_printed())
            .await
    }

    /// Changes the status of the package's lines.
    #[tracing::instrument(skip(self))]
    pub async fn change_order_status(
        &self,
        cmd: ChangeOrderStatus,
    ) -> Result<CommandResult<Package>, DomainError> {
        let status = cmd.status;
        let order = cmd.order;

        self.handler
            .execute(cmd.package_id, |package| {
                package.change_order_status(status, order)
            })
            .await
    }
}
