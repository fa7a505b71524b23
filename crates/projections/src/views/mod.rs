//! Read model views for the admin supply and package pages.

pub mod packages;
pub mod supplies;

pub use packages::{PackageSummary, PackagesView};
pub use supplies::{SuppliesView, SupplySummary};
