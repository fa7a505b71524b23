//! Aggregate and domain event traits.
//!
//! Supplies and packages are stored as a chain of snapshot events: each event
//! carries the full state after the change, and the newest one is the
//! aggregate's current state.

use common::AggregateId;
use event_store::{ClaimChange, EventId, Version};
use serde::{Serialize, de::DeserializeOwned};

/// A persisted change of a supply or package.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Stored event type, e.g. "SupplyOpened".
    fn event_type(&self) -> &'static str;

    /// Identifier carried by the event itself.
    ///
    /// When present it becomes the envelope's event id, so the stored record
    /// and the aggregate's current event share one identity.
    fn event_id(&self) -> Option<EventId> {
        None
    }

    /// Unique claims to acquire or release in the same append.
    fn claims(&self) -> Vec<ClaimChange> {
        Vec::new()
    }
}

/// An event-sourced aggregate.
///
/// Command methods on the aggregate validate against the current state and
/// return new events; `apply` folds an event in and never fails.
pub trait Aggregate: Default + Send + Sync + Sized {
    type Event: DomainEvent;
    type Error: std::error::Error + Send + Sync;

    /// Stored aggregate type, "Supply" or "Package".
    fn aggregate_type() -> &'static str;

    /// None until the first event is applied.
    fn id(&self) -> Option<AggregateId>;

    /// Number of events applied so far.
    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);

    fn apply(&mut self, event: Self::Event);

    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    /// Snapshot of a shelf slot: who holds it and how many items sit on it.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct SlotEvent {
        event_id: EventId,
        slot_id: AggregateId,
        items: u32,
        claimed: bool,
    }

    impl DomainEvent for SlotEvent {
        fn event_type(&self) -> &'static str {
            "SlotChanged"
        }

        fn event_id(&self) -> Option<EventId> {
            Some(self.event_id)
        }

        fn claims(&self) -> Vec<ClaimChange> {
            if self.claimed {
                vec![ClaimChange::Acquire("slot:A1".to_string())]
            } else {
                Vec::new()
            }
        }
    }

    #[derive(Debug, Default)]
    struct Slot {
        current: Option<SlotEvent>,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("slot error")]
    struct SlotError;

    impl Aggregate for Slot {
        type Event = SlotEvent;
        type Error = SlotError;

        fn aggregate_type() -> &'static str {
            "Slot"
        }

        fn id(&self) -> Option<AggregateId> {
            self.current.as_ref().map(|event| event.slot_id)
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            self.current = Some(event);
        }
    }

    fn snapshot(slot_id: AggregateId, items: u32, claimed: bool) -> SlotEvent {
        SlotEvent {
            event_id: EventId::new(),
            slot_id,
            items,
            claimed,
        }
    }

    #[test]
    fn newest_snapshot_is_current_state() {
        let slot_id = AggregateId::new();
        let mut slot = Slot::default();
        assert!(slot.id().is_none());

        slot.apply_events([snapshot(slot_id, 1, true), snapshot(slot_id, 4, false)]);

        assert_eq!(slot.id(), Some(slot_id));
        assert_eq!(slot.current.as_ref().map(|e| e.items), Some(4));
    }

    #[test]
    fn event_carries_its_identity_and_claims() {
        let event = snapshot(AggregateId::new(), 1, true);

        assert_eq!(event.event_id(), Some(event.event_id));
        assert_eq!(event.claims().len(), 1);
        assert!(snapshot(AggregateId::new(), 1, false).claims().is_empty());
    }
}
