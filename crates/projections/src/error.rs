//! Projection error types.

use event_store::{EventEnvelope, EventId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// A stored payload does not match the event type it is filed under.
    #[error("Cannot decode {event_type} event {event_id}: {source}")]
    Decode {
        event_id: EventId,
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProjectionError {
    pub(crate) fn decode(event: &EventEnvelope, source: serde_json::Error) -> Self {
        Self::Decode {
            event_id: event.event_id,
            event_type: event.event_type.clone(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
