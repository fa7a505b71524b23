//! Shipping sticker cache and the marketplace fetch behind it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{PackagingError, Result};

/// Cache of shipping stickers keyed by posting number.
#[async_trait]
pub trait StickerCache: Send + Sync {
    async fn get(&self, posting_number: &str) -> Result<Option<Vec<u8>>>;

    /// Asks the marketplace for the sticker; a successful fetch fills the cache.
    async fn request_fetch(&self, token: &str, posting_number: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryStickerState {
    cached: HashMap<String, Vec<u8>>,
    marketplace: HashMap<String, Vec<u8>>,
    fetches: Vec<(String, String)>,
    fail: bool,
    fail_fetch: bool,
}

/// In-memory sticker cache for testing.
///
/// Stickers registered with [`InMemoryStickerCache::publish`] are what the
/// marketplace would return to a fetch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStickerCache {
    state: Arc<RwLock<InMemoryStickerState>>,
}

impl InMemoryStickerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a sticker straight into the cache.
    pub async fn insert(&self, posting_number: &str, sticker: Vec<u8>) {
        self.state
            .write()
            .await
            .cached
            .insert(posting_number.to_string(), sticker);
    }

    /// Makes a sticker available to the next fetch.
    pub async fn publish(&self, posting_number: &str, sticker: Vec<u8>) {
        self.state
            .write()
            .await
            .marketplace
            .insert(posting_number.to_string(), sticker);
    }

    /// Makes cache reads fail.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    /// Makes marketplace fetches fail; cache reads still work.
    pub async fn set_fail_fetch(&self, fail: bool) {
        self.state.write().await.fail_fetch = fail;
    }

    /// Token and posting number of every fetch requested so far.
    pub async fn fetches(&self) -> Vec<(String, String)> {
        self.state.read().await.fetches.clone()
    }
}

#[async_trait]
impl StickerCache for InMemoryStickerCache {
    async fn get(&self, posting_number: &str) -> Result<Option<Vec<u8>>> {
        let state = self.state.read().await;
        if state.fail {
            return Err(PackagingError::service("stickers", "cache unavailable"));
        }
        Ok(state.cached.get(posting_number).cloned())
    }

    async fn request_fetch(&self, token: &str, posting_number: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .fetches
            .push((token.to_string(), posting_number.to_string()));
        if state.fail_fetch {
            return Err(PackagingError::service("stickers", "marketplace timeout"));
        }

        if let Some(sticker) = state.marketplace.get(posting_number).cloned() {
            state.cached.insert(posting_number.to_string(), sticker);
        }
        Ok(())
    }
}
