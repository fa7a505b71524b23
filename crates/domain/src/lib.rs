//! Domain layer for the packaging workflow.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits with a generic CommandHandler
//! - The supply and package status model
//! - Supply aggregate (shipment batch, `new -> open -> close`)
//! - Package aggregate (one box of order-lines bound to a supply)
//! - Ledger: current-state reads folded from the event store

pub mod aggregate;
pub mod command;
pub mod error;
pub mod ledger;
pub mod package;
pub mod status;
pub mod supply;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use ledger::Ledger;
pub use package::{
    ChangeOrderStatus, MarkPackagePrinted, Package, PackageChange, PackageError, PackageEvent,
    PackageOrder, PackageService, PackageSupplyLink, PackOrders,
};
pub use status::{PackageStatus, StatusCode, SupplyStatus, UnknownStatus};
pub use supply::{
    CloseSupply, OpenNewSupply, OpenSupply, ReconcileSupplyTotal, Supply, SupplyChange,
    SupplyError, SupplyEvent, SupplyIdentifier, SupplyInvariable, SupplyService,
    open_supply_claim,
};
