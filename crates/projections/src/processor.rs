//! Feeds the event log to the registered read models.

use event_store::{EventEnvelope, EventStore};
use futures_util::StreamExt;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};

/// Delivers stored events, in log order, to every registered projection.
///
/// Each projection keeps its own cursor, so a catch-up only hands it the
/// events past that cursor. Rebuilding rewinds every cursor and replays the
/// whole log.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
        }
    }

    pub fn register(&mut self, projection: Box<dyn Projection>) {
        tracing::debug!(
            projection = projection.name(),
            aggregate_type = projection.aggregate_type(),
            "projection registered"
        );
        self.projections.push(projection);
    }

    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Name and cursor of every registered projection.
    pub async fn positions(&self) -> Vec<(&'static str, ProjectionPosition)> {
        let mut positions = Vec::with_capacity(self.projections.len());
        for projection in &self.projections {
            positions.push((projection.name(), projection.position().await));
        }
        positions
    }

    /// Streams the whole log and hands each projection the events past its
    /// cursor. Returns the length of the log.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<u64> {
        let mut stream = self.store.stream_all_events().await?;
        let mut index: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            index += 1;

            for projection in &self.projections {
                if projection.position().await.events_seen < index {
                    deliver(projection.as_ref(), &event).await?;
                }
            }
        }

        tracing::info!(
            events = index,
            projections = self.projections.len(),
            "catch-up complete"
        );
        Ok(index)
    }

    /// Hands a freshly appended event to every projection.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            deliver(projection.as_ref(), event).await?;
        }
        Ok(())
    }

    /// Clears every read model and replays the log from the start.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<u64> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.run_catch_up().await
    }
}

async fn deliver(projection: &dyn Projection, event: &EventEnvelope) -> Result<()> {
    projection.handle(event).await?;
    if projection.folds(event) {
        metrics::counter!("projections_events_processed", "projection" => projection.name())
            .increment(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::AggregateId;
    use event_store::{AppendOptions, InMemoryEventStore, Version};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Counts the events of one aggregate type it is handed.
    struct CountingProjection {
        aggregate_type: &'static str,
        folded: Arc<RwLock<u64>>,
        position: Arc<RwLock<ProjectionPosition>>,
    }

    impl CountingProjection {
        fn new(aggregate_type: &'static str) -> Self {
            Self {
                aggregate_type,
                folded: Arc::new(RwLock::new(0)),
                position: Arc::new(RwLock::new(ProjectionPosition::zero())),
            }
        }
    }

    #[async_trait]
    impl Projection for CountingProjection {
        fn name(&self) -> &'static str {
            "CountingProjection"
        }

        fn aggregate_type(&self) -> &'static str {
            self.aggregate_type
        }

        async fn handle(&self, event: &EventEnvelope) -> Result<()> {
            if self.folds(event) {
                *self.folded.write().await += 1;
            }
            let mut pos = self.position.write().await;
            *pos = pos.advance(event);
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            *self.folded.write().await = 0;
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    fn supply_event(aggregate_id: AggregateId, version: i64) -> EventEnvelope {
        EventEnvelope::new(
            aggregate_id,
            "Supply",
            Version::new(version),
            "SupplyTotalReconciled",
            serde_json::json!({}),
        )
    }

    fn package_event(aggregate_id: AggregateId) -> EventEnvelope {
        EventEnvelope::new(
            aggregate_id,
            "Package",
            Version::first(),
            "PackagePacked",
            serde_json::json!({}),
        )
    }

    async fn seeded_store() -> InMemoryEventStore {
        let store = InMemoryEventStore::new();
        let supply = AggregateId::new();
        store
            .append(
                vec![supply_event(supply, 1), supply_event(supply, 2)],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(vec![package_event(AggregateId::new())], AppendOptions::new())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_catch_up_folds_only_own_aggregate_type() {
        let projection = CountingProjection::new("Supply");
        let folded = Arc::clone(&projection.folded);
        let mut processor = ProjectionProcessor::new(seeded_store().await);
        processor.register(Box::new(projection));

        let events = processor.run_catch_up().await.unwrap();

        assert_eq!(events, 3);
        assert_eq!(*folded.read().await, 2);
        let positions = processor.positions().await;
        assert_eq!(positions[0].1.events_seen, 3);
    }

    #[tokio::test]
    async fn test_second_catch_up_delivers_only_new_events() {
        let store = seeded_store().await;
        let projection = CountingProjection::new("Supply");
        let folded = Arc::clone(&projection.folded);
        let mut processor = ProjectionProcessor::new(store.clone());
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();
        processor.run_catch_up().await.unwrap();
        assert_eq!(*folded.read().await, 2);

        let late = AggregateId::new();
        store
            .append(vec![supply_event(late, 1)], AppendOptions::new())
            .await
            .unwrap();
        processor.run_catch_up().await.unwrap();

        assert_eq!(*folded.read().await, 3);
    }

    #[tokio::test]
    async fn test_process_single_event() {
        let projection = CountingProjection::new("Package");
        let folded = Arc::clone(&projection.folded);
        let position = Arc::clone(&projection.position);
        let mut processor = ProjectionProcessor::new(InMemoryEventStore::new());
        processor.register(Box::new(projection));

        let event = package_event(AggregateId::new());
        processor.process_event(&event).await.unwrap();

        assert_eq!(*folded.read().await, 1);
        assert_eq!(position.read().await.last_event, Some(event.event_id));
    }

    #[tokio::test]
    async fn test_rebuild_resets_and_replays() {
        let projection = CountingProjection::new("Supply");
        let folded = Arc::clone(&projection.folded);
        let position = Arc::clone(&projection.position);
        let mut processor = ProjectionProcessor::new(seeded_store().await);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();
        processor.rebuild_all().await.unwrap();

        assert_eq!(*folded.read().await, 2);
        assert_eq!(position.read().await.events_seen, 3);
    }

    #[tokio::test]
    async fn test_empty_store_catch_up() {
        let projection = CountingProjection::new("Supply");
        let folded = Arc::clone(&projection.folded);
        let mut processor = ProjectionProcessor::new(InMemoryEventStore::new());
        processor.register(Box::new(projection));

        assert_eq!(processor.run_catch_up().await.unwrap(), 0);
        assert_eq!(*folded.read().await, 0);
    }

    #[tokio::test]
    async fn test_projections_are_independent() {
        let supplies = CountingProjection::new("Supply");
        let packages = CountingProjection::new("Package");
        let supplies_folded = Arc::clone(&supplies.folded);
        let packages_folded = Arc::clone(&packages.folded);
        let mut processor = ProjectionProcessor::new(seeded_store().await);
        processor.register(Box::new(supplies));
        processor.register(Box::new(packages));
        assert_eq!(processor.projection_count(), 2);

        processor.run_catch_up().await.unwrap();

        assert_eq!(*supplies_folded.read().await, 2);
        assert_eq!(*packages_folded.read().await, 1);
    }
}
