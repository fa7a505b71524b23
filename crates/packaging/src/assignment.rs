//! Assignment of awaiting orders to a new package.

use std::time::Instant;

use common::{AggregateId, OrderId, ProductIdentity, ProfileId};
use domain::{
    Aggregate, CommandResult, OpenSupply, PackOrders, Package, PackageOrder, PackageService,
    Supply, SupplyService, SupplyStatus,
};
use event_store::EventStore;

use crate::config::Config;
use crate::error::{PackagingError, Result};
use crate::messages::PackageMessage;
use crate::services::{Collaborators, REMOVE_CHANNEL};

/// Request to pack `quantity` units of a product for a profile.
#[derive(Debug, Clone)]
pub struct AssignOrders {
    pub profile: ProfileId,
    pub product: ProductIdentity,
    pub quantity: u32,
}

impl AssignOrders {
    pub fn new(profile: ProfileId, product: ProductIdentity, quantity: u32) -> Self {
        Self {
            profile,
            product,
            quantity,
        }
    }
}

/// Builds packages from orders awaiting packaging and binds them to the
/// profile's active supply.
pub struct OrderAssigner<S: EventStore> {
    supplies: SupplyService<S>,
    packages: PackageService<S>,
    services: Collaborators,
    delivery_type: String,
    transport: String,
}

impl<S: EventStore + Clone> OrderAssigner<S> {
    pub fn new(store: S, services: Collaborators, config: &Config) -> Self {
        Self {
            supplies: SupplyService::new(store.clone()),
            packages: PackageService::new(store),
            services,
            delivery_type: config.delivery_type.clone(),
            transport: config.package_transport.clone(),
        }
    }

    /// Packs orders until the requested quantity is covered.
    ///
    /// Nothing is persisted unless every step succeeds.
    #[tracing::instrument(skip(self, cmd), fields(profile = %cmd.profile, quantity = cmd.quantity))]
    pub async fn assign(&self, cmd: AssignOrders) -> Result<CommandResult<Package>> {
        let start = Instant::now();
        let result = self.run(cmd).await;

        metrics::histogram!("packaging_assignment_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        match &result {
            Ok(packed) => {
                metrics::counter!("packaging_packages_created_total").increment(1);
                if let Some(package_id) = packed.aggregate.id() {
                    tracing::info!(%package_id, lines = packed.aggregate.total(), "package created");
                }
            }
            Err(err) => {
                metrics::counter!("packaging_assignment_failures_total", "kind" => err.kind().as_str())
                    .increment(1);
                tracing::warn!(error = %err, "assignment failed");
            }
        }

        result
    }

    async fn run(&self, cmd: AssignOrders) -> Result<CommandResult<Package>> {
        if cmd.quantity == 0 {
            return Err(PackagingError::InvalidQuantity);
        }

        let product_key = cmd.product.identifier();
        if self.services.catalog.find(&cmd.product).await?.is_none() {
            return Err(PackagingError::ProductNotFound {
                product: product_key,
            });
        }

        self.services
            .notify(
                REMOVE_CHANNEL,
                serde_json::json!({ "identifier": product_key }),
            )
            .await;

        let supply = self
            .supplies
            .active_for(cmd.profile)
            .await?
            .ok_or(PackagingError::NoOpenSupply {
                profile: cmd.profile,
            })?;
        let supply_id = supply.id().ok_or(PackagingError::NoOpenSupply {
            profile: cmd.profile,
        })?;

        let (lines, last_order) = self.collect_lines(&cmd, &product_key).await?;

        self.hand_off_stock(last_order).await?;

        if lines.is_empty() {
            return Err(PackagingError::EmptyPackage);
        }

        self.ensure_open(cmd.profile, supply_id).await?;

        let packed = self
            .packages
            .pack(PackOrders::new(cmd.profile, supply_id, lines))
            .await?;

        if let (Some(package_id), Some(event)) =
            (packed.aggregate.id(), packed.aggregate.current_event_id())
        {
            let message = PackageMessage {
                package_id,
                event,
                last: None,
            };
            // The package is committed; a lost message only delays the supply total.
            if let Err(err) = self
                .services
                .dispatcher
                .dispatch(message.into(), &self.transport)
                .await
            {
                tracing::error!(%package_id, error = %err, "package message not dispatched");
            }
        }

        Ok(packed)
    }

    /// Walks awaiting orders until the quantity is covered.
    ///
    /// Returns the collected lines and the last order that contributed.
    async fn collect_lines(
        &self,
        cmd: &AssignOrders,
        product_key: &str,
    ) -> Result<(Vec<PackageOrder>, OrderId)> {
        let mut lines: Vec<PackageOrder> = Vec::new();
        let mut examined: Vec<OrderId> = Vec::new();
        let mut last_order = None;
        let mut progress: u32 = 0;

        while progress < cmd.quantity {
            let order = self
                .services
                .orders
                .find_packaging_order(&cmd.product, &self.delivery_type, &examined)
                .await?
                .ok_or_else(|| PackagingError::NoMatchingOrder {
                    product: product_key.to_string(),
                })?;
            examined.push(order.id);

            let matched = order
                .line_for(&cmd.product)
                .ok_or(PackagingError::ProductLineNotFound { order: order.id })?;

            if self
                .services
                .packaged
                .is_packaged(order.id, matched.id)
                .await?
            {
                tracing::debug!(order = %order.id, line = %matched.id, "order-line already packaged");
                continue;
            }

            for line in order.lines_for(&cmd.product) {
                if !lines.iter().any(|l| l.order == order.id && l.line == line.id) {
                    lines.push(PackageOrder::new(order.id, line.id));
                }
            }

            progress = progress.saturating_add(matched.quantity);
            last_order = Some(order.id);
        }

        let last_order = last_order.ok_or(PackagingError::EmptyPackage)?;
        Ok((lines, last_order))
    }

    /// Re-reads the supply and moves it to Open before the package is stored.
    ///
    /// The supply may have been closed while orders were collected; a closed
    /// supply never receives a package.
    async fn ensure_open(&self, profile: ProfileId, supply_id: AggregateId) -> Result<()> {
        let supply = self
            .supplies
            .find(supply_id)
            .await?
            .filter(Supply::is_active)
            .ok_or(PackagingError::NoOpenSupply { profile })?;

        if supply.status() == Some(SupplyStatus::New) {
            self.supplies.open(OpenSupply::new(supply_id)).await?;
        }
        Ok(())
    }

    /// Moves the order's stock requests to "ready for hand-off".
    async fn hand_off_stock(&self, order: OrderId) -> Result<()> {
        let requests = self.services.stock.requests_for_order(order).await?;
        if requests.is_empty() {
            return Err(PackagingError::StockRequestNotFound { order });
        }

        for request in requests {
            self.services
                .stock
                .transition_to_ready_for_handoff(request)
                .await
                .map_err(|err| PackagingError::StockTransitionFailed {
                    request,
                    reason: err.to_string(),
                })?;
        }
        Ok(())
    }
}
