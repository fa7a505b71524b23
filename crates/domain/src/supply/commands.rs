//! Supply commands.

use common::{AggregateId, ProfileId};

use crate::command::Command;

use super::Supply;

/// Command to open a new supply for a profile.
#[derive(Debug, Clone)]
pub struct OpenNewSupply {
    /// The supply ID to create.
    pub supply_id: AggregateId,

    /// The acting profile.
    pub profile: ProfileId,
}

impl OpenNewSupply {
    /// Creates the command with a generated supply ID.
    pub fn for_profile(profile: ProfileId) -> Self {
        Self {
            supply_id: AggregateId::new(),
            profile,
        }
    }
}

impl Command for OpenNewSupply {
    type Aggregate = Supply;

    fn aggregate_id(&self) -> AggregateId {
        self.supply_id
    }
}

/// Command to move a New supply to Open.
#[derive(Debug, Clone)]
pub struct OpenSupply {
    pub supply_id: AggregateId,
}

impl OpenSupply {
    pub fn new(supply_id: AggregateId) -> Self {
        Self { supply_id }
    }
}

impl Command for OpenSupply {
    type Aggregate = Supply;

    fn aggregate_id(&self) -> AggregateId {
        self.supply_id
    }
}

/// Command to close a supply.
#[derive(Debug, Clone)]
pub struct CloseSupply {
    pub supply_id: AggregateId,
}

impl CloseSupply {
    pub fn new(supply_id: AggregateId) -> Self {
        Self { supply_id }
    }
}

impl Command for CloseSupply {
    type Aggregate = Supply;

    fn aggregate_id(&self) -> AggregateId {
        self.supply_id
    }
}

/// Command to record a recomputed order-line count.
#[derive(Debug, Clone)]
pub struct ReconcileSupplyTotal {
    pub supply_id: AggregateId,
    pub total: u32,
}

impl ReconcileSupplyTotal {
    pub fn new(supply_id: AggregateId, total: u32) -> Self {
        Self { supply_id, total }
    }
}

impl Command for ReconcileSupplyTotal {
    type Aggregate = Supply;

    fn aggregate_id(&self) -> AggregateId {
        self.supply_id
    }
}
