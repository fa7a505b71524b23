//! Package domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, OrderId, OrderLineId, ProfileId};
use event_store::EventId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::status::PackageStatus;

/// What caused a package event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageChange {
    /// Package was built from order-lines.
    Packed,
    /// All shipping stickers of the package were printed.
    Printed,
    /// Status of some or all lines changed.
    OrderStatusChanged,
}

/// The supply a package belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSupplyLink {
    pub supply: AggregateId,

    /// True once every shipping sticker of the package was obtained and printed.
    pub print: bool,
}

/// One order-line assigned to a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOrder {
    pub order: OrderId,
    pub line: OrderLineId,
    pub status: PackageStatus,

    /// Sort key, the unix timestamp of insertion by default.
    pub sort: i64,
}

impl PackageOrder {
    /// A new line in New status, sorted by insertion time.
    pub fn new(order: OrderId, line: OrderLineId) -> Self {
        Self {
            order,
            line,
            status: PackageStatus::New,
            sort: Utc::now().timestamp(),
        }
    }
}

/// Immutable snapshot of a package, appended on every change.
///
/// Every event carries its own full copy of the line list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageEvent {
    pub event_id: EventId,
    pub package_id: AggregateId,
    pub change: PackageChange,
    pub profile: ProfileId,

    /// Number of order-lines in the package.
    pub total: u32,

    /// True if all lines come from one production batch.
    pub in_part: bool,

    pub supply: PackageSupplyLink,
    pub orders: Vec<PackageOrder>,
    pub created_at: DateTime<Utc>,
}

impl PackageEvent {
    pub(crate) fn next(&self, change: PackageChange) -> Self {
        Self {
            event_id: EventId::new(),
            change,
            created_at: Utc::now(),
            ..self.clone()
        }
    }
}

impl DomainEvent for PackageEvent {
    fn event_type(&self) -> &'static str {
        match self.change {
            PackageChange::Packed => "PackagePacked",
            PackageChange::Printed => "PackagePrinted",
            PackageChange::OrderStatusChanged => "PackageOrderStatusChanged",
        }
    }

    fn event_id(&self) -> Option<EventId> {
        Some(self.event_id)
    }
}
