//! Check for order-lines that already sit in a package.

use async_trait::async_trait;
use common::{OrderId, OrderLineId};
use domain::Ledger;
use event_store::EventStore;

use crate::error::Result;

/// Answers whether an order-line is already assigned.
#[async_trait]
pub trait PackagedLines: Send + Sync {
    /// True if the order-line is in any package with a non-Error status.
    async fn is_packaged(&self, order: OrderId, line: OrderLineId) -> Result<bool>;
}

/// Reads the answer from the event store, so it sees every committed package.
#[derive(Clone)]
pub struct LedgerPackagedLines<S: EventStore> {
    ledger: Ledger<S>,
}

impl<S: EventStore> LedgerPackagedLines<S> {
    pub fn new(store: S) -> Self {
        Self {
            ledger: Ledger::new(store),
        }
    }
}

#[async_trait]
impl<S: EventStore> PackagedLines for LedgerPackagedLines<S> {
    async fn is_packaged(&self, order: OrderId, line: OrderLineId) -> Result<bool> {
        Ok(self.ledger.is_order_line_packaged(order, line).await?)
    }
}
