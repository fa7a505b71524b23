//! Marketplace order source trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, OrderLineId, ProductIdentity};
use tokio::sync::RwLock;

use crate::error::{PackagingError, Result};

/// One product line of a marketplace order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product: ProductIdentity,

    /// Units of the product in this line.
    pub quantity: u32,

    /// Compliance (DataMatrix) code of the item, when the product carries one.
    pub compliance_code: Option<String>,
}

/// A marketplace order as seen by the packaging workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceOrder {
    pub id: OrderId,
    pub number: String,

    /// Marketplace shipment number; stickers are keyed by it.
    pub posting_number: String,

    /// Marketplace API token the order was received with.
    pub token: String,

    pub delivery_type: String,

    /// True while the order sits in "awaiting packaging" status.
    pub awaiting_packaging: bool,

    pub lines: Vec<OrderLine>,
}

impl MarketplaceOrder {
    /// The first line whose product identity matches exactly.
    pub fn line_for(&self, product: &ProductIdentity) -> Option<&OrderLine> {
        self.lines.iter().find(|line| line.product.matches(product))
    }

    /// Every line whose product identity matches exactly.
    pub fn lines_for<'a>(
        &'a self,
        product: &'a ProductIdentity,
    ) -> impl Iterator<Item = &'a OrderLine> + 'a {
        self.lines
            .iter()
            .filter(move |line| line.product.matches(product))
    }

    pub fn line(&self, id: OrderLineId) -> Option<&OrderLine> {
        self.lines.iter().find(|line| line.id == id)
    }
}

/// Read access to marketplace orders.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// The next order awaiting packaging that carries the product and uses
    /// the delivery type, skipping `exclude`.
    async fn find_packaging_order(
        &self,
        product: &ProductIdentity,
        delivery_type: &str,
        exclude: &[OrderId],
    ) -> Result<Option<MarketplaceOrder>>;

    async fn find_order(&self, order: OrderId) -> Result<Option<MarketplaceOrder>>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: Vec<MarketplaceOrder>,
    fail: bool,
}

/// In-memory order source for testing. Orders are returned oldest first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderSource {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: MarketplaceOrder) {
        self.state.write().await.orders.push(order);
    }

    /// Configures the source to fail every lookup.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }
}

#[async_trait]
impl OrderSource for InMemoryOrderSource {
    async fn find_packaging_order(
        &self,
        product: &ProductIdentity,
        delivery_type: &str,
        exclude: &[OrderId],
    ) -> Result<Option<MarketplaceOrder>> {
        let state = self.state.read().await;
        if state.fail {
            return Err(PackagingError::service("orders", "order source unavailable"));
        }

        Ok(state
            .orders
            .iter()
            .filter(|order| order.awaiting_packaging && order.delivery_type == delivery_type)
            .filter(|order| !exclude.contains(&order.id))
            .find(|order| order.line_for(product).is_some())
            .cloned())
    }

    async fn find_order(&self, order: OrderId) -> Result<Option<MarketplaceOrder>> {
        let state = self.state.read().await;
        if state.fail {
            return Err(PackagingError::service("orders", "order source unavailable"));
        }

        Ok(state.orders.iter().find(|o| o.id == order).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OfferId, ProductEventId};

    fn order(product: ProductIdentity, delivery_type: &str) -> MarketplaceOrder {
        MarketplaceOrder {
            id: OrderId::new(),
            number: "O-1".to_string(),
            posting_number: "P-1".to_string(),
            token: "token".to_string(),
            delivery_type: delivery_type.to_string(),
            awaiting_packaging: true,
            lines: vec![OrderLine {
                id: OrderLineId::new(),
                product,
                quantity: 1,
                compliance_code: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_finds_first_matching_order() {
        let source = InMemoryOrderSource::new();
        let product = ProductIdentity::new(ProductEventId::new());
        let first = order(product, "fbs-ozon");
        let second = order(product, "fbs-ozon");
        source.insert(first.clone()).await;
        source.insert(second.clone()).await;

        let found = source
            .find_packaging_order(&product, "fbs-ozon", &[])
            .await
            .unwrap();
        assert_eq!(found.map(|o| o.id), Some(first.id));

        let found = source
            .find_packaging_order(&product, "fbs-ozon", &[first.id])
            .await
            .unwrap();
        assert_eq!(found.map(|o| o.id), Some(second.id));
    }

    #[tokio::test]
    async fn test_absent_component_does_not_match_present_one() {
        let source = InMemoryOrderSource::new();
        let event = ProductEventId::new();
        source
            .insert(order(
                ProductIdentity::new(event).with_offer(OfferId::new()),
                "fbs-ozon",
            ))
            .await;

        let found = source
            .find_packaging_order(&ProductIdentity::new(event), "fbs-ozon", &[])
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_filters_by_delivery_and_status() {
        let source = InMemoryOrderSource::new();
        let product = ProductIdentity::new(ProductEventId::new());
        let mut not_ready = order(product, "fbs-ozon");
        not_ready.awaiting_packaging = false;
        source.insert(not_ready).await;
        source.insert(order(product, "fbo-ozon")).await;

        let found = source
            .find_packaging_order(&product, "fbs-ozon", &[])
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
