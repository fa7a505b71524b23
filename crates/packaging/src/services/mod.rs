//! Collaborator traits and in-memory implementations.

pub mod barcode;
pub mod notifier;
pub mod orders;
pub mod packaged;
pub mod products;
pub mod stickers;
pub mod stock;

use std::sync::Arc;

use event_store::EventStore;

pub use barcode::{BarcodeFormat, BarcodeRenderer, InMemoryBarcodeRenderer, Symbology};
pub use notifier::{Broadcast, InMemoryNotifier, Notifier, REMOVE_CHANNEL};
pub use orders::{InMemoryOrderSource, MarketplaceOrder, OrderLine, OrderSource};
pub use packaged::{LedgerPackagedLines, PackagedLines};
pub use products::{BarcodeSettings, InMemoryProductCatalog, ProductCatalog, ProductDetail};
pub use stickers::{InMemoryStickerCache, StickerCache};
pub use stock::{InMemoryStockFulfillment, StockFulfillment, StockRequest, StockRequestStatus};

use crate::dispatcher::MessageDispatcher;

/// The collaborators a use case may call.
#[derive(Clone)]
pub struct Collaborators {
    pub orders: Arc<dyn OrderSource>,
    pub packaged: Arc<dyn PackagedLines>,
    pub stock: Arc<dyn StockFulfillment>,
    pub stickers: Arc<dyn StickerCache>,
    pub barcodes: Arc<dyn BarcodeRenderer>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub notifier: Arc<dyn Notifier>,
    pub dispatcher: Arc<dyn MessageDispatcher>,
}

impl Collaborators {
    /// Best-effort broadcast; failures are logged and swallowed.
    pub(crate) async fn notify(&self, channel: &str, payload: serde_json::Value) {
        if let Err(err) = self.notifier.broadcast(channel, payload).await {
            tracing::warn!(channel, error = %err, "broadcast failed");
        }
    }
}

/// In-memory collaborators, kept as handles so callers can seed and inspect
/// them after wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServices {
    pub orders: InMemoryOrderSource,
    pub stock: InMemoryStockFulfillment,
    pub stickers: InMemoryStickerCache,
    pub barcodes: InMemoryBarcodeRenderer,
    pub catalog: InMemoryProductCatalog,
    pub notifier: InMemoryNotifier,
}

impl InMemoryServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires the handles, with the packaged-line check reading `store`.
    pub fn collaborators<S>(&self, store: S, dispatcher: Arc<dyn MessageDispatcher>) -> Collaborators
    where
        S: EventStore + 'static,
    {
        Collaborators {
            orders: Arc::new(self.orders.clone()),
            packaged: Arc::new(LedgerPackagedLines::new(store)),
            stock: Arc::new(self.stock.clone()),
            stickers: Arc::new(self.stickers.clone()),
            barcodes: Arc::new(self.barcodes.clone()),
            catalog: Arc::new(self.catalog.clone()),
            notifier: Arc::new(self.notifier.clone()),
            dispatcher,
        }
    }
}
