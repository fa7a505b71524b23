//! Stock fulfillment trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, StockRequestId};
use tokio::sync::RwLock;

use crate::error::{PackagingError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockRequestStatus {
    /// Reserved for the order, still on the shelf.
    Reserved,
    /// Packed and waiting for the courier.
    ReadyForHandoff,
}

/// A warehouse stock request raised for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRequest {
    pub id: StockRequestId,
    pub order: OrderId,
    pub status: StockRequestStatus,
}

/// Trait for warehouse stock operations.
#[async_trait]
pub trait StockFulfillment: Send + Sync {
    async fn requests_for_order(&self, order: OrderId) -> Result<Vec<StockRequestId>>;

    /// Moves the request to "ready for hand-off".
    async fn transition_to_ready_for_handoff(&self, request: StockRequestId)
    -> Result<StockRequest>;
}

#[derive(Debug, Default)]
struct InMemoryStockState {
    requests: HashMap<StockRequestId, StockRequest>,
    fail_on_transition: bool,
}

/// In-memory stock fulfillment for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockFulfillment {
    state: Arc<RwLock<InMemoryStockState>>,
}

impl InMemoryStockFulfillment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a reserved stock request for the order.
    pub async fn add_request(&self, order: OrderId) -> StockRequestId {
        let id = StockRequestId::new();
        self.state.write().await.requests.insert(
            id,
            StockRequest {
                id,
                order,
                status: StockRequestStatus::Reserved,
            },
        );
        id
    }

    /// Configures the service to reject every transition.
    pub async fn set_fail_on_transition(&self, fail: bool) {
        self.state.write().await.fail_on_transition = fail;
    }

    pub async fn status_of(&self, request: StockRequestId) -> Option<StockRequestStatus> {
        self.state
            .read()
            .await
            .requests
            .get(&request)
            .map(|r| r.status)
    }
}

#[async_trait]
impl StockFulfillment for InMemoryStockFulfillment {
    async fn requests_for_order(&self, order: OrderId) -> Result<Vec<StockRequestId>> {
        Ok(self
            .state
            .read()
            .await
            .requests
            .values()
            .filter(|r| r.order == order)
            .map(|r| r.id)
            .collect())
    }

    async fn transition_to_ready_for_handoff(
        &self,
        request: StockRequestId,
    ) -> Result<StockRequest> {
        let mut state = self.state.write().await;

        if state.fail_on_transition {
            return Err(PackagingError::service("stock", "warehouse rejected transition"));
        }

        let stock = state
            .requests
            .get_mut(&request)
            .ok_or_else(|| PackagingError::service("stock", format!("unknown request {request}")))?;
        stock.status = StockRequestStatus::ReadyForHandoff;
        Ok(stock.clone())
    }
}
