//! Packages read model for the supply detail and print pages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, OrderId, ProfileId};
use domain::{Aggregate, Package, PackageEvent, PackageOrder};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::error::{ProjectionError, Result};
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Summary of a package.
#[derive(Debug, Clone)]
pub struct PackageSummary {
    pub package_id: AggregateId,
    pub profile: ProfileId,
    pub supply_id: AggregateId,
    pub printed: bool,
    pub in_part: bool,
    pub lines: Vec<PackageOrder>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PackageSummary {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn contains_order(&self, order: OrderId) -> bool {
        self.lines.iter().any(|line| line.order == order)
    }
}

/// Read model view over every package, keyed by package id.
#[derive(Clone)]
pub struct PackagesView {
    packages: Arc<RwLock<HashMap<AggregateId, PackageSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl PackagesView {
    pub fn new() -> Self {
        Self {
            packages: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    pub async fn get_package(&self, package_id: AggregateId) -> Option<PackageSummary> {
        self.packages.read().await.get(&package_id).cloned()
    }

    /// Packages of a supply, oldest first.
    pub async fn get_packages_by_supply(&self, supply_id: AggregateId) -> Vec<PackageSummary> {
        let mut packages: Vec<PackageSummary> = self
            .packages
            .read()
            .await
            .values()
            .filter(|p| p.supply_id == supply_id)
            .cloned()
            .collect();
        packages.sort_by_key(|p| p.created_at);
        packages
    }

    /// Packages of a supply whose stickers are not printed yet.
    pub async fn get_unprinted_packages(&self, supply_id: AggregateId) -> Vec<PackageSummary> {
        self.get_packages_by_supply(supply_id)
            .await
            .into_iter()
            .filter(|p| !p.printed)
            .collect()
    }

    /// The most recent package holding a line of the order.
    pub async fn get_package_by_order(&self, order: OrderId) -> Option<PackageSummary> {
        self.packages
            .read()
            .await
            .values()
            .filter(|p| p.contains_order(order))
            .max_by_key(|p| p.created_at)
            .cloned()
    }

    /// Total line count across the packages of a supply.
    pub async fn get_line_count(&self, supply_id: AggregateId) -> usize {
        self.packages
            .read()
            .await
            .values()
            .filter(|p| p.supply_id == supply_id)
            .map(PackageSummary::line_count)
            .sum()
    }
}

impl Default for PackagesView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for PackagesView {
    fn name(&self) -> &'static str {
        "PackagesView"
    }

    fn aggregate_type(&self) -> &'static str {
        Package::aggregate_type()
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if self.folds(event) {
            let package_event: PackageEvent = event
                .decode()
                .map_err(|err| ProjectionError::decode(event, err))?;
            let mut packages = self.packages.write().await;

            let created_at = packages
                .get(&event.aggregate_id)
                .map(|p| p.created_at)
                .unwrap_or(package_event.created_at);

            packages.insert(
                event.aggregate_id,
                PackageSummary {
                    package_id: event.aggregate_id,
                    profile: package_event.profile,
                    supply_id: package_event.supply.supply,
                    printed: package_event.supply.print,
                    in_part: package_event.in_part,
                    lines: package_event.orders,
                    created_at,
                    updated_at: package_event.created_at,
                },
            );
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance(event);

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.packages.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

#[async_trait]
impl ReadModel for PackagesView {
    fn name(&self) -> &'static str {
        "PackagesView"
    }

    async fn len(&self) -> usize {
        self.packages.read().await.len()
    }
}
