//! Supply domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, ProfileId};
use event_store::{ClaimChange, EventId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::status::SupplyStatus;

use super::{SupplyIdentifier, open_supply_claim};

/// What caused a supply event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyChange {
    /// Supply was opened for a profile.
    Created,
    /// First package was packed against the supply.
    Opened,
    /// Order count was recomputed.
    TotalReconciled,
    /// Supply was finalized.
    Closed,
}

/// Values carried unchanged from event to event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyInvariable {
    /// Owning profile.
    pub profile: ProfileId,

    /// Number of package order-lines in the supply.
    pub total: u32,
}

/// Immutable snapshot of a supply, appended on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyEvent {
    pub event_id: EventId,
    pub supply_id: AggregateId,
    pub change: SupplyChange,
    pub status: SupplyStatus,
    pub invariable: SupplyInvariable,
    pub identifier: SupplyIdentifier,
    pub created_at: DateTime<Utc>,
}

impl SupplyEvent {
    /// Copies this snapshot into a new event with a fresh id and timestamp.
    pub(crate) fn next(&self, change: SupplyChange, status: SupplyStatus) -> Self {
        Self {
            event_id: EventId::new(),
            supply_id: self.supply_id,
            change,
            status,
            invariable: self.invariable,
            identifier: self.identifier.clone(),
            created_at: Utc::now(),
        }
    }
}

impl DomainEvent for SupplyEvent {
    fn event_type(&self) -> &'static str {
        match self.change {
            SupplyChange::Created => "SupplyCreated",
            SupplyChange::Opened => "SupplyOpened",
            SupplyChange::TotalReconciled => "SupplyTotalReconciled",
            SupplyChange::Closed => "SupplyClosed",
        }
    }

    fn event_id(&self) -> Option<EventId> {
        Some(self.event_id)
    }

    fn claims(&self) -> Vec<ClaimChange> {
        let key = open_supply_claim(self.invariable.profile);
        match self.change {
            SupplyChange::Created => vec![ClaimChange::Acquire(key)],
            SupplyChange::Closed => vec![ClaimChange::Release(key)],
            SupplyChange::Opened | SupplyChange::TotalReconciled => Vec::new(),
        }
    }
}
