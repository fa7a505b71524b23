//! Supply aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod identifier;
mod service;

pub use aggregate::Supply;
pub use commands::*;
pub use events::{SupplyChange, SupplyEvent, SupplyInvariable};
pub use identifier::SupplyIdentifier;
pub use service::SupplyService;

use common::{AggregateId, ProfileId};
use thiserror::Error;

use crate::status::SupplyStatus;

/// Claim key held by a profile's single New/Open supply.
pub fn open_supply_claim(profile: ProfileId) -> String {
    format!("open-supply:{profile}")
}

/// Errors that can occur during supply operations.
#[derive(Debug, Error)]
pub enum SupplyError {
    /// The profile already has a New or Open supply.
    #[error("Profile {profile} already has an open supply {supply}")]
    AlreadyOpen {
        profile: ProfileId,
        supply: AggregateId,
    },

    /// The supply has no current event to act on.
    #[error("Supply has no active event")]
    NoActiveEvent,

    /// The supply is not in a state that allows the action.
    #[error("Invalid state transition: cannot {action} supply in {current} status")]
    InvalidStateTransition {
        current: SupplyStatus,
        action: &'static str,
    },

    /// Supply is already created.
    #[error("Supply already created")]
    AlreadyCreated,
}
