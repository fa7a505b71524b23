//! Append-only event storage.
//!
//! Events are grouped by aggregate and versioned for optimistic concurrency.
//! Appends may also acquire or release named unique claims atomically with the
//! events, which is how cross-aggregate uniqueness rules are enforced at the
//! storage layer.

pub mod claim;
pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use claim::ClaimChange;
pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use query::EventQuery;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
