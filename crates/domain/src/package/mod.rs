//! Package aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::Package;
pub use commands::*;
pub use events::{PackageChange, PackageEvent, PackageOrder, PackageSupplyLink};
pub use service::PackageService;

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during package operations.
#[derive(Debug, Error)]
pub enum PackageError {
    /// A package must carry at least one order-line.
    #[error("Package has no order-lines")]
    Empty,

    /// Package is already packed.
    #[error("Package already packed")]
    AlreadyPacked,

    /// The package has no current event to act on.
    #[error("Package has no active event")]
    NoActiveEvent,

    /// The order is not part of the package.
    #[error("Order {order} is not in the package")]
    OrderNotInPackage { order: OrderId },
}
