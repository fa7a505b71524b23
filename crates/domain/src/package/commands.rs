//! Package commands.

use common::{AggregateId, OrderId, ProfileId};

use crate::command::Command;
use crate::status::PackageStatus;

use super::{Package, PackageOrder};

/// Command to pack order-lines into a new package.
#[derive(Debug, Clone)]
pub struct PackOrders {
    /// The package ID to create.
    pub package_id: AggregateId,

    /// The acting profile.
    pub profile: ProfileId,

    /// The supply the package is bound to.
    pub supply: AggregateId,

    /// Lines in insertion order.
    pub orders: Vec<PackageOrder>,
}

impl PackOrders {
    /// Creates the command with a generated package ID.
    pub fn new(profile: ProfileId, supply: AggregateId, orders: Vec<PackageOrder>) -> Self {
        Self {
            package_id: AggregateId::new(),
            profile,
            supply,
            orders,
        }
    }
}

impl Command for PackOrders {
    type Aggregate = Package;

    fn aggregate_id(&self) -> AggregateId {
        self.package_id
    }
}

/// Command to set a package's print flag.
#[derive(Debug, Clone)]
pub struct MarkPackagePrinted {
    pub package_id: AggregateId,
}

impl MarkPackagePrinted {
    pub fn new(package_id: AggregateId) -> Self {
        Self { package_id }
    }
}

impl Command for MarkPackagePrinted {
    type Aggregate = Package;

    fn aggregate_id(&self) -> AggregateId {
        self.package_id
    }
}

/// Command to change the status of a package's lines.
#[derive(Debug, Clone)]
pub struct ChangeOrderStatus {
    pub package_id: AggregateId,
    pub status: PackageStatus,

    /// Restricts the change to one order; every line when None.
    pub order: Option<OrderId>,
}

impl ChangeOrderStatus {
    pub fn new(package_id: AggregateId, status: PackageStatus) -> Self {
        Self {
            package_id,
            status,
            order: None,
        }
    }

    pub fn for_order(mut self, order: OrderId) -> Self {
        self.order = Some(order);
        self
    }
}

impl Command for ChangeOrderStatus {
    type Aggregate = Package;

    fn aggregate_id(&self) -> AggregateId {
        self.package_id
    }
}
