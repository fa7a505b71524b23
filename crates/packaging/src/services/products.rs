//! Product catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{ProductIdentity, ProductMainId};
use tokio::sync::RwLock;

use crate::error::Result;

/// Catalog card of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetail {
    pub identity: ProductIdentity,

    /// The product card the identity belongs to.
    pub main: Option<ProductMainId>,

    pub name: String,
    pub article: Option<String>,
    pub barcode: Option<String>,
}

/// How the marketplace barcode label of a product is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeSettings {
    pub main: ProductMainId,

    /// Labels printed per unit.
    pub counter: u32,

    pub show_name: bool,

    /// Extra property lines printed under the barcode.
    pub properties: Vec<String>,
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find(&self, product: &ProductIdentity) -> Result<Option<ProductDetail>>;

    async fn barcode_settings(&self, main: ProductMainId) -> Result<Option<BarcodeSettings>>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: Vec<ProductDetail>,
    settings: HashMap<ProductMainId, BarcodeSettings>,
}

/// In-memory product catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, product: ProductDetail) {
        self.state.write().await.products.push(product);
    }

    pub async fn insert_settings(&self, settings: BarcodeSettings) {
        self.state
            .write()
            .await
            .settings
            .insert(settings.main, settings);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find(&self, product: &ProductIdentity) -> Result<Option<ProductDetail>> {
        Ok(self
            .state
            .read()
            .await
            .products
            .iter()
            .find(|p| p.identity.matches(product))
            .cloned())
    }

    async fn barcode_settings(&self, main: ProductMainId) -> Result<Option<BarcodeSettings>> {
        Ok(self.state.read().await.settings.get(&main).cloned())
    }
}
