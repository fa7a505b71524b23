//! Query-side view contract.

use async_trait::async_trait;

/// A view that admin lists and print pages read from.
#[async_trait]
pub trait ReadModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of rows in the view.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
