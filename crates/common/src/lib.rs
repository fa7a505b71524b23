//! Identifiers shared by every crate in the workspace.

mod product;
mod types;

pub use product::ProductIdentity;
pub use types::{
    AggregateId, ModificationId, OfferId, OrderId, OrderLineId, ProductEventId, ProductMainId,
    ProfileId, StockRequestId, VariationId,
};
