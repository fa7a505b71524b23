//! Print preparation and completion tracking.
//!
//! Preparing a print collects one sheet per package in scope: the shipping
//! sticker of each order, its compliance code and the product barcode. A
//! package whose every sticker was obtained is printable, and for package and
//! supply scopes a [`PrintPackageMessage`] is dispatched for it so the worker
//! can mark it printed.

use common::{AggregateId, OrderId};
use domain::{Aggregate, Ledger, Package, PackageService};
use event_store::EventStore;

use crate::config::Config;
use crate::error::{PackagingError, Result};
use crate::messages::PrintPackageMessage;
use crate::services::{
    BarcodeFormat, BarcodeSettings, Collaborators, MarketplaceOrder, ProductDetail,
    REMOVE_CHANNEL, Symbology,
};

/// What to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintScope {
    /// Reprint of one order; never marks packages printed.
    Order(OrderId),
    Package(AggregateId),
    /// Unprinted packages of the supply.
    Supply(AggregateId),
}

impl PrintScope {
    fn marks_printed(&self) -> bool {
        !matches!(self, PrintScope::Order(_))
    }
}

/// Print data of one order in a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSheet {
    pub order: OrderId,
    pub number: String,
    pub posting_number: String,

    /// Shipping sticker, absent when the marketplace has not produced it yet.
    pub sticker: Option<Vec<u8>>,

    /// Rendered compliance code.
    pub datamatrix: Option<String>,
}

/// Print data of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSheet {
    pub package_id: AggregateId,
    pub product: ProductDetail,

    /// Rendered product barcode.
    pub barcode: String,

    pub settings: Option<BarcodeSettings>,
    pub orders: Vec<OrderSheet>,

    /// True when every order of the sheet has its sticker.
    pub printable: bool,
}

impl PackageSheet {
    /// Assembles a sheet from its collected parts, deciding printability.
    pub fn assemble(
        package_id: AggregateId,
        product: ProductDetail,
        barcode: String,
        settings: Option<BarcodeSettings>,
        orders: Vec<OrderSheet>,
    ) -> Self {
        let printable = orders.iter().all(|order| order.sticker.is_some());
        Self {
            package_id,
            product,
            barcode,
            settings,
            orders,
            printable,
        }
    }
}

/// Everything needed to render a print run.
#[derive(Debug, Clone)]
pub struct PrintBundle {
    pub scope: PrintScope,
    pub packages: Vec<PackageSheet>,
}

impl PrintBundle {
    pub fn printable_packages(&self) -> impl Iterator<Item = AggregateId> + '_ {
        self.packages
            .iter()
            .filter(|sheet| sheet.printable)
            .map(|sheet| sheet.package_id)
    }
}

/// Order data and product collected for one package before reduction.
struct Collected {
    orders: Vec<OrderSheet>,
    product: Option<ProductDetail>,
}

pub struct PrintTracker<S: EventStore> {
    packages: PackageService<S>,
    ledger: Ledger<S>,
    services: Collaborators,
    transport: String,
}

impl<S: EventStore + Clone> PrintTracker<S> {
    pub fn new(store: S, services: Collaborators, config: &Config) -> Self {
        Self {
            packages: PackageService::new(store.clone()),
            ledger: Ledger::new(store),
            services,
            transport: config.package_transport.clone(),
        }
    }

    /// Collects print data for the scope and dispatches print completion for
    /// every printable package.
    #[tracing::instrument(skip(self))]
    pub async fn prepare(&self, scope: PrintScope) -> Result<PrintBundle> {
        let packages = self.packages_in(scope).await?;

        let mut sheets = Vec::with_capacity(packages.len());
        for package in &packages {
            sheets.push(self.sheet_for(package, scope).await?);
        }

        if scope.marks_printed() {
            for sheet in sheets.iter().filter(|sheet| sheet.printable) {
                let message = PrintPackageMessage {
                    package_id: sheet.package_id,
                };
                self.services
                    .dispatcher
                    .dispatch(message.into(), &self.transport)
                    .await?;
            }
        }

        for sheet in &sheets {
            self.services
                .notify(
                    REMOVE_CHANNEL,
                    serde_json::json!({ "identifier": sheet.package_id.to_string() }),
                )
                .await;
        }

        let bundle = PrintBundle {
            scope,
            packages: sheets,
        };
        tracing::info!(
            packages = bundle.packages.len(),
            printable = bundle.printable_packages().count(),
            "print prepared"
        );
        Ok(bundle)
    }

    async fn packages_in(&self, scope: PrintScope) -> Result<Vec<Package>> {
        let packages = match scope {
            PrintScope::Package(package_id) => vec![
                self.packages
                    .find(package_id)
                    .await?
                    .ok_or(PackagingError::PackageNotFound(package_id))?,
            ],
            PrintScope::Supply(supply_id) => self.ledger.unprinted_packages(supply_id).await?,
            PrintScope::Order(order) => self.ledger.packages_with_order(order).await?,
        };

        if packages.is_empty() {
            return Err(PackagingError::NothingToPrint);
        }
        Ok(packages)
    }

    async fn sheet_for(&self, package: &Package, scope: PrintScope) -> Result<PackageSheet> {
        let package_id = package.id().ok_or(PackagingError::NothingToPrint)?;
        let orders = match scope {
            PrintScope::Order(order) => vec![order],
            PrintScope::Package(_) | PrintScope::Supply(_) => package.order_ids(),
        };

        let mut collected = Collected {
            orders: Vec::with_capacity(orders.len()),
            product: None,
        };
        for order_id in orders {
            let order = self
                .services
                .orders
                .find_order(order_id)
                .await?
                .ok_or(PackagingError::OrderNotFound(order_id))?;
            self.collect_order(package, &order, &mut collected).await?;
        }

        let product = collected
            .product
            .ok_or_else(|| PackagingError::ProductNotFound {
                product: package_id.to_string(),
            })?;
        let barcode_text = product.barcode.as_deref().ok_or_else(|| {
            PackagingError::BarcodeMissing {
                product: product.identity.identifier(),
            }
        })?;
        let barcode = self.render(barcode_text, Symbology::Code128).await?;
        let settings = match product.main {
            Some(main) => self.services.catalog.barcode_settings(main).await?,
            None => None,
        };

        Ok(PackageSheet::assemble(
            package_id,
            product,
            barcode,
            settings,
            collected.orders,
        ))
    }

    async fn collect_order(
        &self,
        package: &Package,
        order: &MarketplaceOrder,
        collected: &mut Collected,
    ) -> Result<()> {
        let sticker = self.sticker_for(order).await;

        let lines: Vec<_> = package
            .orders()
            .iter()
            .filter(|line| line.order == order.id)
            .filter_map(|line| order.line(line.line))
            .collect();

        let datamatrix = match lines.iter().find_map(|line| line.compliance_code.as_deref()) {
            Some(code) => Some(self.render(code, Symbology::DataMatrix).await?),
            None => None,
        };

        if collected.product.is_none()
            && let Some(line) = lines.first()
        {
            let product = self.services.catalog.find(&line.product).await?.ok_or_else(|| {
                PackagingError::ProductNotFound {
                    product: line.product.identifier(),
                }
            })?;
            collected.product = Some(product);
        }

        collected.orders.push(OrderSheet {
            order: order.id,
            number: order.number.clone(),
            posting_number: order.posting_number.clone(),
            sticker,
            datamatrix,
        });
        Ok(())
    }

    /// Cached sticker, fetching it once on a miss.
    ///
    /// Cache and marketplace failures count as a miss: the package becomes
    /// unprintable and the rest of the scope is still collected.
    async fn sticker_for(&self, order: &MarketplaceOrder) -> Option<Vec<u8>> {
        if let Some(sticker) = self.cached_sticker(order).await {
            return Some(sticker);
        }

        if let Err(err) = self
            .services
            .stickers
            .request_fetch(&order.token, &order.posting_number)
            .await
        {
            tracing::warn!(order = %order.id, posting = %order.posting_number, error = %err, "sticker fetch failed");
            return None;
        }

        let sticker = self.cached_sticker(order).await;
        if sticker.is_none() {
            tracing::warn!(order = %order.id, posting = %order.posting_number, "sticker not available");
        }
        sticker
    }

    async fn cached_sticker(&self, order: &MarketplaceOrder) -> Option<Vec<u8>> {
        self.services
            .stickers
            .get(&order.posting_number)
            .await
            .inspect_err(|err| {
                tracing::warn!(posting = %order.posting_number, error = %err, "sticker cache read failed");
            })
            .ok()
            .flatten()
    }

    async fn render(&self, text: &str, symbology: Symbology) -> Result<String> {
        self.services
            .barcodes
            .render(text, symbology, BarcodeFormat::Svg)
            .await
            .map_err(|err| match err {
                err @ PackagingError::BarcodeRender(_) => err,
                other => PackagingError::BarcodeRender(other.to_string()),
            })
    }
}
