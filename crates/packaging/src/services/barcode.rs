//! Barcode rendering trait and a markup-only in-memory renderer.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{PackagingError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    /// Compliance codes.
    DataMatrix,
    /// Product barcodes.
    Code128,
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbology::DataMatrix => write!(f, "datamatrix"),
            Symbology::Code128 => write!(f, "code128"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeFormat {
    Svg,
}

/// Renders barcode text into an image.
#[async_trait]
pub trait BarcodeRenderer: Send + Sync {
    async fn render(&self, text: &str, symbology: Symbology, format: BarcodeFormat)
    -> Result<String>;
}

#[derive(Debug, Default)]
struct InMemoryBarcodeState {
    rendered: Vec<(String, Symbology)>,
    fail: bool,
}

/// Renderer for tests: emits a single SVG path element naming the input.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBarcodeRenderer {
    state: Arc<RwLock<InMemoryBarcodeState>>,
}

impl InMemoryBarcodeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    pub async fn rendered(&self) -> Vec<(String, Symbology)> {
        self.state.read().await.rendered.clone()
    }
}

#[async_trait]
impl BarcodeRenderer for InMemoryBarcodeRenderer {
    async fn render(
        &self,
        text: &str,
        symbology: Symbology,
        format: BarcodeFormat,
    ) -> Result<String> {
        let mut state = self.state.write().await;
        if state.fail {
            return Err(PackagingError::BarcodeRender(format!(
                "{symbology} writer exited with an error"
            )));
        }

        state.rendered.push((text.to_string(), symbology));
        match format {
            BarcodeFormat::Svg => Ok(format!(
                "<path data-symbology=\"{symbology}\" data-text=\"{text}\"/>"
            )),
        }
    }
}
