//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::package::PackageError;
use crate::status::UnknownStatus;
use crate::supply::SupplyError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// An error occurred in the supply aggregate.
    #[error("Supply error: {0}")]
    Supply(#[from] SupplyError),

    /// An error occurred in the package aggregate.
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    /// A persisted status code is not part of the status table.
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
