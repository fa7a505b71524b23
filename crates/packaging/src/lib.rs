//! Packaging use cases on top of the supply and package aggregates.
//!
//! This crate provides:
//! - `OrderAssigner`: builds a package from orders awaiting packaging
//! - `PrintTracker`: collects print data and dispatches print completion
//! - `TotalReconciler` and `PackagingWorker`: asynchronous follow-up of package changes
//! - `TotalSweep`: re-dispatches package messages for supplies whose total drifted
//! - Collaborator traits with in-memory implementations
//! - Configuration and telemetry for the `packaging-worker` binary

pub mod assignment;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod print;
pub mod reconciler;
pub mod services;
pub mod sweep;
pub mod telemetry;
pub mod worker;

pub use assignment::{AssignOrders, OrderAssigner};
pub use config::{Config, LogFormat};
pub use dispatcher::{ChannelDispatcher, Dispatched, MessageDispatcher};
pub use error::{ErrorKind, PackagingError, Result};
pub use messages::{Message, PackageMessage, PrintPackageMessage};
pub use print::{OrderSheet, PackageSheet, PrintBundle, PrintScope, PrintTracker};
pub use reconciler::TotalReconciler;
pub use services::{Collaborators, InMemoryServices};
pub use sweep::TotalSweep;
pub use worker::PackagingWorker;
