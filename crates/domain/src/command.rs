//! Command handling infrastructure.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};
use serde::Serialize;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Rebuilds an aggregate from its stored envelopes, in version order.
pub fn replay<A: Aggregate>(
    envelopes: impl IntoIterator<Item = EventEnvelope>,
) -> Result<A, DomainError> {
    let mut aggregate = A::default();
    for envelope in envelopes {
        let event: A::Event = envelope.decode()?;
        aggregate.apply(event);
        aggregate.set_version(envelope.version);
    }
    Ok(aggregate)
}

/// Outcome of a command: the updated aggregate and what was appended.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    pub aggregate: A,

    /// Appended events; empty when the command was a no-op.
    pub events: Vec<A::Event>,

    pub new_version: Version,
}

/// A request addressed to one aggregate.
pub trait Command: Send + Sync {
    type Aggregate: Aggregate;

    fn aggregate_id(&self) -> AggregateId;
}

/// Loads an aggregate, runs a command method on it and appends the events.
///
/// The append expects the version that was loaded, so two commands racing on
/// the same aggregate cannot both succeed. Claims declared by the events are
/// acquired or released in the same append.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replays the aggregate; a default instance when it has no events.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        let events = self.store.get_events_for_aggregate(aggregate_id).await?;
        replay(events)
    }

    /// Replays the aggregate, or None when it has no events.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Runs `command_fn` against the current state and appends its events.
    ///
    /// An empty event list appends nothing and leaves the version unchanged.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, current_version, &events)?;

        let mut options = if current_version == Version::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_version(current_version)
        };
        options.claims = events.iter().flat_map(|event| event.claims()).collect();

        let new_version = self.store.append(envelopes, options).await?;

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Numbers the events from `current_version` and keeps their own ids.
    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError>
    where
        A::Event: Serialize,
    {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let mut envelope = EventEnvelope::from_payload(
                aggregate_id,
                A::aggregate_type(),
                version,
                event.event_type(),
                event,
            )?;
            if let Some(event_id) = event.event_id() {
                envelope = envelope.with_event_id(event_id);
            }
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}
