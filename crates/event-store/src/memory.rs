use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, ClaimChange, EventEnvelope, EventQuery, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

#[derive(Default)]
struct State {
    events: Vec<EventEnvelope>,
    claims: HashMap<String, AggregateId>,
}

impl State {
    fn current_version(&self, aggregate_id: AggregateId) -> Version {
        self.events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial())
    }
}

/// In-memory event store implementation for testing and single-process runs.
///
/// Events and claims share one lock, so an append observes and changes both
/// atomically, matching the transactional PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the log.
    pub async fn event_count(&self) -> usize {
        self.state.read().await.events.len()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let first_event = &events[0];
        let aggregate_id = first_event.aggregate_id;

        let mut state = self.state.write().await;
        let current_version = state.current_version(aggregate_id);

        // Stale writer
        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Unique (aggregate_id, version) constraint
        if first_event.version <= current_version {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        // Validate every claim before touching state
        for change in &options.claims {
            if let ClaimChange::Acquire(key) = change
                && let Some(holder) = state.claims.get(key)
                && *holder != aggregate_id
            {
                metrics::counter!("event_store_claim_conflicts_total").increment(1);
                return Err(EventStoreError::ClaimConflict {
                    key: key.clone(),
                    holder: *holder,
                });
            }
        }

        for change in options.claims {
            match change {
                ClaimChange::Acquire(key) => {
                    state.claims.insert(key, aggregate_id);
                }
                ClaimChange::Release(key) => {
                    if state.claims.get(&key) == Some(&aggregate_id) {
                        state.claims.remove(&key);
                    }
                }
            }
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());
        state.events.extend(events);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        let mut events: Vec<_> = state
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        let limit = query.limit.unwrap_or(usize::MAX);

        // The event vector is the log, already in append order
        Ok(state
            .events
            .iter()
            .filter(|e| query.matches(e))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.state.read().await.events.clone();
        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let state = self.state.read().await;
        let version = state
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max();
        Ok(version)
    }

    async fn claim_holder(&self, key: &str) -> Result<Option<AggregateId>> {
        Ok(self.state.read().await.claims.get(key).copied())
    }
}
