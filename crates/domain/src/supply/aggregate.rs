//! Supply aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, ProfileId};
use event_store::{EventId, Version};

use crate::aggregate::Aggregate;
use crate::status::SupplyStatus;

use super::{SupplyChange, SupplyError, SupplyEvent, SupplyIdentifier, SupplyInvariable};

/// Supply aggregate root.
///
/// A shipment batch of packages. All state lives on the current event; the
/// aggregate only remembers which event is current and when the supply was
/// created.
#[derive(Debug, Clone, Default)]
pub struct Supply {
    id: Option<AggregateId>,
    version: Version,
    current: Option<SupplyEvent>,
    created_at: Option<DateTime<Utc>>,
}

impl Aggregate for Supply {
    type Event = SupplyEvent;
    type Error = SupplyError;

    fn aggregate_type() -> &'static str {
        "Supply"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        if self.id.is_none() {
            self.id = Some(event.supply_id);
            self.created_at = Some(event.created_at);
        }
        self.current = Some(event);
    }
}

// Query methods
impl Supply {
    /// The latest event, if any.
    pub fn current(&self) -> Option<&SupplyEvent> {
        self.current.as_ref()
    }

    pub fn current_event_id(&self) -> Option<EventId> {
        self.current.as_ref().map(|event| event.event_id)
    }

    pub fn status(&self) -> Option<SupplyStatus> {
        self.current.as_ref().map(|event| event.status)
    }

    pub fn profile(&self) -> Option<ProfileId> {
        self.current.as_ref().map(|event| event.invariable.profile)
    }

    /// Denormalized order-line count.
    pub fn total(&self) -> u32 {
        self.current
            .as_ref()
            .map(|event| event.invariable.total)
            .unwrap_or(0)
    }

    pub fn identifier(&self) -> Option<&SupplyIdentifier> {
        self.current.as_ref().map(|event| &event.identifier)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns true while the supply is New or Open.
    pub fn is_active(&self) -> bool {
        self.status().is_some_and(|status| status.is_active())
    }

    fn require_current(&self) -> Result<&SupplyEvent, SupplyError> {
        self.current.as_ref().ok_or(SupplyError::NoActiveEvent)
    }
}

// Command methods (return events)
impl Supply {
    /// Creates a new supply in New status.
    pub fn create(
        &self,
        supply_id: AggregateId,
        profile: ProfileId,
        identifier: SupplyIdentifier,
    ) -> Result<Vec<SupplyEvent>, SupplyError> {
        if self.id.is_some() {
            return Err(SupplyError::AlreadyCreated);
        }

        Ok(vec![SupplyEvent {
            event_id: EventId::new(),
            supply_id,
            change: SupplyChange::Created,
            status: SupplyStatus::New,
            invariable: SupplyInvariable { profile, total: 0 },
            identifier,
            created_at: Utc::now(),
        }])
    }

    /// Moves a New supply to Open. Already open supplies are left as they are.
    pub fn open(&self) -> Result<Vec<SupplyEvent>, SupplyError> {
        let current = self.require_current()?;
        match current.status {
            SupplyStatus::New => Ok(vec![current.next(SupplyChange::Opened, SupplyStatus::Open)]),
            SupplyStatus::Open => Ok(vec![]),
            SupplyStatus::Close => Err(SupplyError::InvalidStateTransition {
                current: SupplyStatus::Close,
                action: "open",
            }),
        }
    }

    /// Closes the supply, keeping profile, total and identifier.
    pub fn close(&self) -> Result<Vec<SupplyEvent>, SupplyError> {
        let current = self.require_current()?;
        if current.status.is_terminal() {
            return Err(SupplyError::InvalidStateTransition {
                current: current.status,
                action: "close",
            });
        }

        Ok(vec![current.next(SupplyChange::Closed, SupplyStatus::Close)])
    }

    /// Records a recomputed order-line count.
    ///
    /// Always appends, even when the count is unchanged.
    pub fn reconcile_total(&self, total: u32) -> Result<Vec<SupplyEvent>, SupplyError> {
        let current = self.require_current()?;
        if current.status.is_terminal() {
            return Err(SupplyError::InvalidStateTransition {
                current: current.status,
                action: "reconcile total of",
            });
        }

        let mut event = current.next(SupplyChange::TotalReconciled, current.status);
        event.invariable.total = total;
        Ok(vec![event])
    }
}
