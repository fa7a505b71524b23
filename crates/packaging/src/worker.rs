//! Background handling of dispatched package messages.

use std::future::Future;
use std::sync::Arc;

use domain::{MarkPackagePrinted, PackageService};
use event_store::EventStore;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;

use crate::config::Config;
use crate::dispatcher::{Dispatched, MessageDispatcher};
use crate::error::{PackagingError, Result};
use crate::messages::{Message, PackageMessage, PrintPackageMessage};
use crate::reconciler::TotalReconciler;

/// Consumes the package transport: reconciles supply totals and marks
/// packages printed.
pub struct PackagingWorker<S: EventStore> {
    reconciler: TotalReconciler<S>,
    packages: PackageService<S>,
    dispatcher: Arc<dyn MessageDispatcher>,
    transport: String,
}

impl<S: EventStore + Clone> PackagingWorker<S> {
    pub fn new(store: S, dispatcher: Arc<dyn MessageDispatcher>, config: &Config) -> Self {
        Self {
            reconciler: TotalReconciler::new(store.clone()),
            packages: PackageService::new(store),
            dispatcher,
            transport: config.package_transport.clone(),
        }
    }

    /// Handles one dispatched message. Messages for other transports are ignored.
    #[tracing::instrument(skip(self, dispatched), fields(package_id = %dispatched.message.package_id()))]
    pub async fn handle(&self, dispatched: Dispatched) -> Result<()> {
        if dispatched.transport != self.transport {
            tracing::debug!(transport = %dispatched.transport, "message for another transport");
            return Ok(());
        }

        match dispatched.message {
            Message::Package(message) => {
                self.reconciler.reconcile(message.package_id).await?;
            }
            Message::PrintPackage(message) => self.mark_printed(message).await?,
        }
        Ok(())
    }

    async fn mark_printed(&self, message: PrintPackageMessage) -> Result<()> {
        let package_id = message.package_id;
        let last = self
            .packages
            .find(package_id)
            .await?
            .ok_or(PackagingError::PackageNotFound(package_id))?
            .current_event_id();

        let printed = self
            .packages
            .mark_printed(MarkPackagePrinted::new(package_id))
            .await?;
        if printed.events.is_empty() {
            tracing::debug!(%package_id, "package already printed");
            return Ok(());
        }

        metrics::counter!("packaging_packages_printed_total").increment(1);
        tracing::info!(%package_id, "package printed");

        if let Some(event) = printed.aggregate.current_event_id() {
            let message = PackageMessage {
                package_id,
                event,
                last,
            };
            self.dispatcher
                .dispatch(message.into(), &self.transport)
                .await?;
        }
        Ok(())
    }

    /// Handles messages until the channel closes or `shutdown` resolves.
    ///
    /// A failing message is logged and dropped; the loop keeps going.
    pub async fn run<F>(&self, mut receiver: UnboundedReceiver<Dispatched>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(transport = %self.transport, "packaging worker started");

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("packaging worker received shutdown signal");
                    break;
                }
                next = receiver.recv() => match next {
                    Some(dispatched) => self.handle_logged(dispatched).await,
                    None => {
                        tracing::info!("package transport closed");
                        break;
                    }
                },
            }
        }

        tracing::info!("packaging worker stopped");
    }

    /// Handles every message already queued, including ones dispatched while
    /// draining. Returns the number handled.
    pub async fn drain(&self, receiver: &mut UnboundedReceiver<Dispatched>) -> usize {
        let mut handled = 0;
        loop {
            match receiver.try_recv() {
                Ok(dispatched) => {
                    self.handle_logged(dispatched).await;
                    handled += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return handled,
            }
        }
    }

    async fn handle_logged(&self, dispatched: Dispatched) {
        let package_id = dispatched.message.package_id();
        if let Err(err) = self.handle(dispatched).await {
            tracing::warn!(%package_id, error = %err, kind = err.kind().as_str(), "message handling failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ChannelDispatcher;
    use common::{AggregateId, OrderId, OrderLineId, ProfileId};
    use domain::{Aggregate, OpenNewSupply, PackOrders, PackageOrder, SupplyService};
    use event_store::InMemoryEventStore;

    async fn packed(store: &InMemoryEventStore) -> (AggregateId, AggregateId) {
        let profile = ProfileId::new();
        let supply = SupplyService::new(store.clone())
            .open_new(OpenNewSupply::for_profile(profile))
            .await
            .unwrap();
        let supply_id = supply.aggregate.id().unwrap();
        let package = PackageService::new(store.clone())
            .pack(PackOrders::new(
                profile,
                supply_id,
                vec![PackageOrder::new(OrderId::new(), OrderLineId::new())],
            ))
            .await
            .unwrap();
        (supply_id, package.aggregate.id().unwrap())
    }

    fn print_message(package_id: AggregateId, transport: &str) -> Dispatched {
        Dispatched {
            transport: transport.to_string(),
            message: PrintPackageMessage { package_id }.into(),
        }
    }

    #[tokio::test]
    async fn test_print_message_marks_package_once() {
        let store = InMemoryEventStore::new();
        let (_, package_id) = packed(&store).await;
        let (dispatcher, mut receiver) = ChannelDispatcher::channel();
        let config = Config::default();
        let worker = PackagingWorker::new(store.clone(), Arc::new(dispatcher), &config);

        worker
            .handle(print_message(package_id, &config.package_transport))
            .await
            .unwrap();
        worker
            .handle(print_message(package_id, &config.package_transport))
            .await
            .unwrap();

        let package = PackageService::new(store).find(package_id).await.unwrap().unwrap();
        assert!(package.is_printed());

        let follow_up = receiver.try_recv().unwrap();
        match follow_up.message {
            Message::Package(message) => {
                assert_eq!(message.package_id, package_id);
                assert_eq!(Some(message.event), package.current_event_id());
                assert!(message.last.is_some());
                assert_ne!(message.last, Some(message.event));
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_other_transport_is_ignored() {
        let store = InMemoryEventStore::new();
        let (_, package_id) = packed(&store).await;
        let (dispatcher, _receiver) = ChannelDispatcher::channel();
        let worker = PackagingWorker::new(store.clone(), Arc::new(dispatcher), &Config::default());
        let before = store.event_count().await;

        worker
            .handle(print_message(package_id, "another-transport"))
            .await
            .unwrap();

        assert_eq!(store.event_count().await, before);
    }

    #[tokio::test]
    async fn test_drain_follows_print_with_reconciliation() {
        let store = InMemoryEventStore::new();
        let (supply_id, package_id) = packed(&store).await;
        let (dispatcher, mut receiver) = ChannelDispatcher::channel();
        let config = Config::default();
        let dispatcher = Arc::new(dispatcher);
        let worker = PackagingWorker::new(store.clone(), dispatcher.clone(), &config);

        dispatcher
            .dispatch(PrintPackageMessage { package_id }.into(), &config.package_transport)
            .await
            .unwrap();

        assert_eq!(worker.drain(&mut receiver).await, 2);
        let supply = SupplyService::new(store).find(supply_id).await.unwrap().unwrap();
        assert_eq!(supply.total(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = InMemoryEventStore::new();
        let (dispatcher, receiver) = ChannelDispatcher::channel();
        let worker = PackagingWorker::new(store, Arc::new(dispatcher), &Config::default());

        worker.run(receiver, async {}).await;
    }
}
