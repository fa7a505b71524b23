//! Filters for reading a slice of the event log.

use crate::{AggregateId, Version};

/// Selects events by aggregate, aggregate type, event type and version.
///
/// Results always come back in log order (the order events were appended),
/// which is the order the ledger and the read models fold them in.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub aggregate_id: Option<AggregateId>,

    /// "Supply" or "Package".
    pub aggregate_type: Option<String>,

    /// Any of these event types.
    pub event_types: Option<Vec<String>>,

    /// Inclusive lower version bound.
    pub from_version: Option<Version>,

    /// Inclusive upper version bound.
    pub to_version: Option<Version>,

    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_aggregate(aggregate_id: AggregateId) -> Self {
        Self::new().aggregate_id(aggregate_id)
    }

    /// Every event of one aggregate type, e.g. all supply events.
    pub fn for_aggregate_type(aggregate_type: impl Into<String>) -> Self {
        Self::new().aggregate_type(aggregate_type)
    }

    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn event_type(self, event_type: impl Into<String>) -> Self {
        self.event_types(vec![event_type.into()])
    }

    pub fn event_types(mut self, event_types: Vec<String>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    pub fn from_version(mut self, version: Version) -> Self {
        self.from_version = Some(version);
        self
    }

    pub fn to_version(mut self, version: Version) -> Self {
        self.to_version = Some(version);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True if the event passes every filter except the limit.
    pub fn matches(&self, event: &crate::EventEnvelope) -> bool {
        self.aggregate_id.is_none_or(|id| event.aggregate_id == id)
            && self
                .aggregate_type
                .as_deref()
                .is_none_or(|t| event.is_of(t))
            && self
                .event_types
                .as_ref()
                .is_none_or(|types| types.contains(&event.event_type))
            && self.from_version.is_none_or(|v| event.version >= v)
            && self.to_version.is_none_or(|v| event.version <= v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventEnvelope;

    fn supply_event(version: i64, event_type: &str) -> EventEnvelope {
        EventEnvelope::new(
            AggregateId::new(),
            "Supply",
            Version::new(version),
            event_type,
            serde_json::json!({}),
        )
    }

    #[test]
    fn query_for_aggregate_type() {
        let query = EventQuery::for_aggregate_type("Supply");

        assert_eq!(query.aggregate_type.as_deref(), Some("Supply"));
        assert!(query.matches(&supply_event(1, "SupplyCreated")));
        assert!(!query.matches(&EventEnvelope::new(
            AggregateId::new(),
            "Package",
            Version::first(),
            "PackagePacked",
            serde_json::json!({}),
        )));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(EventQuery::new().matches(&supply_event(7, "SupplyClosed")));
    }

    #[test]
    fn version_bounds_are_inclusive() {
        let query = EventQuery::new()
            .from_version(Version::new(2))
            .to_version(Version::new(3));

        assert!(!query.matches(&supply_event(1, "SupplyCreated")));
        assert!(query.matches(&supply_event(2, "SupplyOpened")));
        assert!(query.matches(&supply_event(3, "SupplyTotalReconciled")));
        assert!(!query.matches(&supply_event(4, "SupplyClosed")));
    }

    #[test]
    fn event_types_match_any() {
        let query = EventQuery::new().event_types(vec![
            "SupplyOpened".to_string(),
            "SupplyClosed".to_string(),
        ]);

        assert!(query.matches(&supply_event(2, "SupplyOpened")));
        assert!(!query.matches(&supply_event(1, "SupplyCreated")));
    }

    #[test]
    fn for_aggregate_pins_the_id() {
        let event = supply_event(1, "SupplyCreated");

        assert!(EventQuery::for_aggregate(event.aggregate_id).matches(&event));
        assert!(!EventQuery::for_aggregate(AggregateId::new()).matches(&event));
    }
}
