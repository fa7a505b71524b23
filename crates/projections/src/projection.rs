//! Projection trait and the cursor each projection keeps over the event log.

use std::fmt;

use async_trait::async_trait;
use event_store::{EventEnvelope, EventId};

use crate::Result;

/// How far a projection has read the global event log.
///
/// Every event offered to the projection moves the cursor, whether or not it
/// belongs to the aggregate type the projection folds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Events offered so far, in log order.
    pub events_seen: u64,

    /// The last event offered.
    pub last_event: Option<EventId>,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// The position after `event`.
    pub fn advance(&self, event: &EventEnvelope) -> Self {
        Self {
            events_seen: self.events_seen + 1,
            last_event: Some(event.event_id),
        }
    }
}

impl fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_event {
            Some(event) => write!(f, "position({} @ {event})", self.events_seen),
            None => write!(f, "position({})", self.events_seen),
        }
    }
}

/// Folds the events of one aggregate type into a read model.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    /// The aggregate type whose events change the read model.
    fn aggregate_type(&self) -> &'static str;

    /// True if the event belongs to [`Projection::aggregate_type`].
    fn folds(&self, event: &EventEnvelope) -> bool {
        event.is_of(self.aggregate_type())
    }

    /// Applies the event when the projection folds it, then advances the
    /// position either way.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    async fn position(&self) -> ProjectionPosition;

    /// Clears the read model and rewinds the position to zero.
    async fn reset(&self) -> Result<()>;
}
