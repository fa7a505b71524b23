//! Real-time notifications to operator screens.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{PackagingError, Result};

/// Channel telling other operators to hide an item from their screens.
pub const REMOVE_CHANNEL: &str = "remove";

/// A published notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub channel: String,
    pub payload: Value,
}

/// Publishes notifications. Delivery is best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn broadcast(&self, channel: &str, payload: Value) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<Broadcast>,
    fail: bool,
}

/// In-memory notifier recording every broadcast.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    pub async fn sent(&self) -> Vec<Broadcast> {
        self.state.read().await.sent.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn broadcast(&self, channel: &str, payload: Value) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail {
            return Err(PackagingError::service("notifier", "publisher unreachable"));
        }
        state.sent.push(Broadcast {
            channel: channel.to_string(),
            payload,
        });
        Ok(())
    }
}
