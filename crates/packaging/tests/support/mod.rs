//! Shared harness for the packaging integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use common::{AggregateId, OrderId, OrderLineId, ProductEventId, ProductIdentity, ProfileId};
use domain::{Aggregate, OpenNewSupply, PackageService, SupplyService};
use event_store::InMemoryEventStore;
use packaging::services::{MarketplaceOrder, OrderLine, ProductDetail};
use packaging::{
    ChannelDispatcher, Collaborators, Config, Dispatched, InMemoryServices, Message,
    OrderAssigner, PackagingWorker, PrintTracker,
};
use tokio::sync::mpsc::UnboundedReceiver;

pub struct Harness {
    pub store: InMemoryEventStore,
    pub services: InMemoryServices,
    pub collaborators: Collaborators,
    pub config: Config,
    pub assigner: OrderAssigner<InMemoryEventStore>,
    pub tracker: PrintTracker<InMemoryEventStore>,
    pub worker: PackagingWorker<InMemoryEventStore>,
    pub receiver: UnboundedReceiver<Dispatched>,
    pub supplies: SupplyService<InMemoryEventStore>,
    pub packages: PackageService<InMemoryEventStore>,
}

pub fn setup() -> Harness {
    let store = InMemoryEventStore::new();
    let services = InMemoryServices::new();
    let config = Config::default();
    let (dispatcher, receiver) = ChannelDispatcher::channel();
    let dispatcher = Arc::new(dispatcher);

    let collaborators = services.collaborators(store.clone(), dispatcher.clone());

    Harness {
        assigner: OrderAssigner::new(store.clone(), collaborators.clone(), &config),
        tracker: PrintTracker::new(store.clone(), collaborators.clone(), &config),
        worker: PackagingWorker::new(store.clone(), dispatcher, &config),
        supplies: SupplyService::new(store.clone()),
        packages: PackageService::new(store.clone()),
        store,
        services,
        collaborators,
        config,
        receiver,
    }
}

impl Harness {
    /// Opens a New supply for the profile.
    pub async fn open_supply(&self, profile: ProfileId) -> AggregateId {
        self.supplies
            .open_new(OpenNewSupply::for_profile(profile))
            .await
            .unwrap()
            .aggregate
            .id()
            .unwrap()
    }

    /// Adds a catalog product with a barcode and returns its identity.
    pub async fn product(&self) -> ProductIdentity {
        let identity = ProductIdentity::new(ProductEventId::new());
        self.services
            .catalog
            .insert(ProductDetail {
                identity,
                main: None,
                name: "Winter tyre 205/55 R16".to_string(),
                article: Some("WT-20555".to_string()),
                barcode: Some("4600000000017".to_string()),
            })
            .await;
        identity
    }

    /// Adds an awaiting order with one line of the product and a reserved
    /// stock request.
    pub async fn order(&self, product: ProductIdentity, quantity: u32) -> MarketplaceOrder {
        let order = self.draft_order(product, quantity);
        self.insert_order(order.clone()).await;
        order
    }

    pub async fn order_without_stock(
        &self,
        product: ProductIdentity,
        quantity: u32,
    ) -> MarketplaceOrder {
        let order = self.draft_order(product, quantity);
        self.services.orders.insert(order.clone()).await;
        order
    }

    /// An awaiting order with one line of the product, not yet stored.
    pub fn draft_order(&self, product: ProductIdentity, quantity: u32) -> MarketplaceOrder {
        let id = OrderId::new();
        MarketplaceOrder {
            id,
            number: format!("N-{id}"),
            posting_number: format!("P-{id}"),
            token: "seller-token".to_string(),
            delivery_type: self.config.delivery_type.clone(),
            awaiting_packaging: true,
            lines: vec![OrderLine {
                id: OrderLineId::new(),
                product,
                quantity,
                compliance_code: None,
            }],
        }
    }

    /// Stores the order with a reserved stock request.
    pub async fn insert_order(&self, order: MarketplaceOrder) {
        self.services.stock.add_request(order.id).await;
        self.services.orders.insert(order).await;
    }

    /// Drains every message dispatched so far without handling it.
    pub fn take_dispatched(&mut self) -> Vec<Dispatched> {
        let mut dispatched = Vec::new();
        while let Ok(next) = self.receiver.try_recv() {
            dispatched.push(next);
        }
        dispatched
    }

    /// Lets the worker handle every queued message.
    pub async fn run_worker(&mut self) -> usize {
        self.worker.drain(&mut self.receiver).await
    }
}

pub fn print_messages(dispatched: &[Dispatched]) -> Vec<AggregateId> {
    dispatched
        .iter()
        .filter_map(|d| match &d.message {
            Message::PrintPackage(message) => Some(message.package_id),
            Message::Package(_) => None,
        })
        .collect()
}
