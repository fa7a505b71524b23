//! Supplies read model: the admin supply list and per-profile lookups.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, ProfileId};
use domain::{Aggregate, Supply, SupplyEvent, SupplyStatus};
use event_store::{EventEnvelope, EventId};
use tokio::sync::RwLock;

use crate::error::{ProjectionError, Result};
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Summary row of a supply.
#[derive(Debug, Clone)]
pub struct SupplySummary {
    pub supply_id: AggregateId,
    pub profile: ProfileId,
    pub identifier: String,
    pub status: SupplyStatus,
    pub total: u32,
    pub current_event_id: EventId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read model view over every supply, keyed by supply id.
#[derive(Clone)]
pub struct SuppliesView {
    supplies: Arc<RwLock<HashMap<AggregateId, SupplySummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl SuppliesView {
    pub fn new() -> Self {
        Self {
            supplies: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    pub async fn get_supply(&self, supply_id: AggregateId) -> Option<SupplySummary> {
        self.supplies.read().await.get(&supply_id).cloned()
    }

    /// Supplies of a profile, newest first.
    pub async fn get_supplies_by_profile(&self, profile: ProfileId) -> Vec<SupplySummary> {
        let mut supplies: Vec<SupplySummary> = self
            .supplies
            .read()
            .await
            .values()
            .filter(|s| s.profile == profile)
            .cloned()
            .collect();
        supplies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        supplies
    }

    /// The most recently created supply of the profile, in any status.
    pub async fn get_last_supply(&self, profile: ProfileId) -> Option<SupplySummary> {
        self.get_supplies_by_profile(profile).await.into_iter().next()
    }

    /// The profile's New or Open supply.
    pub async fn get_active_supply(&self, profile: ProfileId) -> Option<SupplySummary> {
        self.get_supplies_by_profile(profile)
            .await
            .into_iter()
            .find(|s| s.status.is_active())
    }

    pub async fn get_supplies_by_status(&self, status: SupplyStatus) -> Vec<SupplySummary> {
        self.supplies
            .read()
            .await
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect()
    }
}

impl Default for SuppliesView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for SuppliesView {
    fn name(&self) -> &'static str {
        "SuppliesView"
    }

    fn aggregate_type(&self) -> &'static str {
        Supply::aggregate_type()
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if self.folds(event) {
            let supply_event: SupplyEvent = event
                .decode()
                .map_err(|err| ProjectionError::decode(event, err))?;
            let mut supplies = self.supplies.write().await;

            // Events are full snapshots; only the creation date survives from
            // the previous row.
            let created_at = supplies
                .get(&event.aggregate_id)
                .map(|s| s.created_at)
                .unwrap_or(supply_event.created_at);

            supplies.insert(
                event.aggregate_id,
                SupplySummary {
                    supply_id: event.aggregate_id,
                    profile: supply_event.invariable.profile,
                    identifier: supply_event.identifier.to_string(),
                    status: supply_event.status,
                    total: supply_event.invariable.total,
                    current_event_id: supply_event.event_id,
                    created_at,
                    updated_at: supply_event.created_at,
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
        self.supplies.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

#[async_trait]
impl ReadModel for SuppliesView {
    fn name(&self) -> &'static str {
        "SuppliesView"
    }

    async fn len(&self) -> usize {
        self.supplies.read().await.len()
    }
}
