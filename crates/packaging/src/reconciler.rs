//! Recomputes a supply's order-line total after one of its packages changed.

use common::AggregateId;
use domain::{CommandResult, Ledger, PackageService, ReconcileSupplyTotal, Supply, SupplyService};
use event_store::EventStore;

use crate::error::{PackagingError, Result};

pub struct TotalReconciler<S: EventStore> {
    supplies: SupplyService<S>,
    packages: PackageService<S>,
    ledger: Ledger<S>,
}

impl<S: EventStore + Clone> TotalReconciler<S> {
    pub fn new(store: S) -> Self {
        Self {
            supplies: SupplyService::new(store.clone()),
            packages: PackageService::new(store.clone()),
            ledger: Ledger::new(store),
        }
    }

    /// Appends the recounted total to the package's supply.
    ///
    /// Returns `None` when the supply is closed and was left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(
        &self,
        package_id: AggregateId,
    ) -> Result<Option<CommandResult<Supply>>> {
        let package = self
            .packages
            .find(package_id)
            .await?
            .ok_or(PackagingError::PackageNotFound(package_id))?;
        let supply_id = package
            .supply_id()
            .ok_or(PackagingError::PackageNotFound(package_id))?;

        let Some(supply) = self.supplies.find(supply_id).await? else {
            tracing::warn!(%supply_id, "package refers to a missing supply");
            return Ok(None);
        };
        if let Some(status) = supply.status().filter(|status| status.is_terminal()) {
            tracing::info!(%supply_id, %status, "supply closed, total left unchanged");
            return Ok(None);
        }

        let total = self.ledger.supply_line_count(supply_id).await?;
        let reconciled = self
            .supplies
            .reconcile_total(ReconcileSupplyTotal::new(supply_id, total))
            .await?;

        metrics::counter!("packaging_supply_reconciliations_total").increment(1);
        tracing::info!(%supply_id, total, "supply total reconciled");
        Ok(Some(reconciled))
    }
}
