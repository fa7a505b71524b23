//! Packaging error types.

use common::{AggregateId, OrderId, ProfileId, StockRequestId};
use domain::{DomainError, PackageError, SupplyError};
use event_store::EventStoreError;
use thiserror::Error;

/// Errors that can occur during packaging use cases.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// The requested quantity must be positive.
    #[error("Quantity must be positive")]
    InvalidQuantity,

    /// The profile has no New or Open supply.
    #[error("Profile {profile} has no open supply")]
    NoOpenSupply { profile: ProfileId },

    /// No order awaiting packaging matches the product.
    #[error("No order awaiting packaging for product {product}")]
    NoMatchingOrder { product: String },

    /// The order has no line for the product.
    #[error("Order {order} has no line for the product")]
    ProductLineNotFound { order: OrderId },

    /// The order has no stock requests to hand off.
    #[error("No stock request found for order {order}")]
    StockRequestNotFound { order: OrderId },

    /// A stock request could not be moved to ready for hand-off.
    #[error("Stock request {request} could not be made ready for hand-off: {reason}")]
    StockTransitionFailed {
        request: StockRequestId,
        reason: String,
    },

    /// The assignment collected no order-lines.
    #[error("No order-lines collected for the package")]
    EmptyPackage,

    /// The product is missing from the catalog.
    #[error("Product not found: {product}")]
    ProductNotFound { product: String },

    /// The product has no barcode to print.
    #[error("Product {product} has no barcode")]
    BarcodeMissing { product: String },

    /// A barcode could not be rendered.
    #[error("Barcode render failed: {0}")]
    BarcodeRender(String),

    /// Package not found.
    #[error("Package not found: {0}")]
    PackageNotFound(AggregateId),

    /// Order not found in the order source.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The print scope holds nothing to print.
    #[error("Nothing to print")]
    NothingToPrint,

    /// A message could not be handed to its transport.
    #[error("Dispatch to {transport} failed: {reason}")]
    Dispatch { transport: String, reason: String },

    /// A collaborator service failed.
    #[error("{service} service error: {reason}")]
    Service {
        service: &'static str,
        reason: String,
    },

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a failure, for callers deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request conflicts with current state.
    InvariantViolation,
    /// Something the request refers to does not exist.
    NotFound,
    /// A collaborator failed or returned unusable data.
    DependencyFailure,
    Internal,
}

impl ErrorKind {
    /// Label value used in metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::DependencyFailure => "dependency_failure",
            ErrorKind::Internal => "internal",
        }
    }
}

impl PackagingError {
    pub(crate) fn service(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Service {
            service,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuantity | Self::EmptyPackage => ErrorKind::InvariantViolation,
            Self::NoOpenSupply { .. }
            | Self::NoMatchingOrder { .. }
            | Self::ProductLineNotFound { .. }
            | Self::ProductNotFound { .. }
            | Self::PackageNotFound(_)
            | Self::OrderNotFound(_)
            | Self::NothingToPrint => ErrorKind::NotFound,
            Self::StockRequestNotFound { .. }
            | Self::StockTransitionFailed { .. }
            | Self::BarcodeMissing { .. }
            | Self::BarcodeRender(_)
            | Self::Dispatch { .. }
            | Self::Service { .. } => ErrorKind::DependencyFailure,
            Self::Domain(err) => domain_kind(err),
            Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

fn domain_kind(err: &DomainError) -> ErrorKind {
    match err {
        DomainError::Supply(SupplyError::NoActiveEvent)
        | DomainError::Package(PackageError::NoActiveEvent | PackageError::OrderNotInPackage { .. })
        | DomainError::AggregateNotFound { .. } => ErrorKind::NotFound,
        DomainError::Supply(_)
        | DomainError::Package(_)
        | DomainError::EventStore(
            EventStoreError::ConcurrencyConflict { .. }
            | EventStoreError::ClaimConflict { .. }
            | EventStoreError::InvalidAppend(_),
        ) => ErrorKind::InvariantViolation,
        DomainError::EventStore(_) | DomainError::UnknownStatus(_) | DomainError::Serialization(_) => {
            ErrorKind::Internal
        }
    }
}

/// Convenience type alias for packaging results.
pub type Result<T> = std::result::Result<T, PackagingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use domain::SupplyStatus;

    #[test]
    fn already_open_is_an_invariant_violation() {
        let err = PackagingError::from(DomainError::from(SupplyError::AlreadyOpen {
            profile: ProfileId::new(),
            supply: AggregateId::new(),
        }));
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn invalid_transition_is_an_invariant_violation() {
        let err = PackagingError::from(DomainError::from(SupplyError::InvalidStateTransition {
            current: SupplyStatus::Close,
            action: "close",
        }));
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn concurrency_conflict_is_an_invariant_violation() {
        let err = PackagingError::from(DomainError::from(EventStoreError::ConcurrencyConflict {
            aggregate_id: AggregateId::new(),
            expected: event_store::Version::new(1),
            actual: event_store::Version::new(2),
        }));
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn missing_things_are_not_found() {
        assert_eq!(
            PackagingError::NoOpenSupply {
                profile: ProfileId::new()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(PackagingError::NothingToPrint.kind(), ErrorKind::NotFound);
        assert_eq!(
            PackagingError::from(DomainError::from(SupplyError::NoActiveEvent)).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn collaborator_failures_are_dependency_failures() {
        assert_eq!(
            PackagingError::StockRequestNotFound {
                order: OrderId::new()
            }
            .kind(),
            ErrorKind::DependencyFailure
        );
        assert_eq!(
            PackagingError::BarcodeRender("exit status 1".to_string()).kind(),
            ErrorKind::DependencyFailure
        );
    }
}
