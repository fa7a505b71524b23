//! Current-state reads folded straight from the event store.
//!
//! The write path uses these instead of read models, so a check made just
//! before a command sees every event committed so far.

use std::collections::{HashMap, HashSet};

use common::{AggregateId, OrderId, OrderLineId, ProfileId};
use event_store::{EventEnvelope, EventStore, EventStoreExt};

use crate::aggregate::Aggregate;
use crate::command::replay;
use crate::error::DomainError;
use crate::package::Package;
use crate::supply::Supply;

/// Consistent queries over supplies and packages.
#[derive(Clone)]
pub struct Ledger<S: EventStore> {
    store: S,
}

impl<S: EventStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuilds every aggregate of type `A`, in order of first appearance.
    ///
    /// Events are snapshots, so only the first event (identity and creation
    /// time) and the newest one (current state and version) are decoded.
    async fn fold<A: Aggregate>(&self) -> Result<Vec<A>, DomainError> {
        let envelopes = self.store.events_of_type(A::aggregate_type()).await?;

        let mut order = Vec::new();
        let mut ends: HashMap<AggregateId, (EventEnvelope, Option<EventEnvelope>)> =
            HashMap::new();
        for envelope in envelopes {
            match ends.get_mut(&envelope.aggregate_id) {
                Some((_, newest)) => *newest = Some(envelope),
                None => {
                    order.push(envelope.aggregate_id);
                    ends.insert(envelope.aggregate_id, (envelope, None));
                }
            }
        }

        order
            .into_iter()
            .filter_map(|id| ends.remove(&id))
            .map(|(first, newest)| replay::<A>(std::iter::once(first).chain(newest)))
            .collect()
    }

    pub async fn supplies(&self) -> Result<Vec<Supply>, DomainError> {
        self.fold::<Supply>().await
    }

    pub async fn packages(&self) -> Result<Vec<Package>, DomainError> {
        self.fold::<Package>().await
    }

    /// Supplies of a profile, oldest first.
    pub async fn supplies_of(&self, profile: ProfileId) -> Result<Vec<Supply>, DomainError> {
        let mut supplies: Vec<Supply> = self
            .supplies()
            .await?
            .into_iter()
            .filter(|supply| supply.profile() == Some(profile))
            .collect();
        supplies.sort_by_key(Supply::created_at);
        Ok(supplies)
    }

    /// The profile's New or Open supply.
    pub async fn active_supply(&self, profile: ProfileId) -> Result<Option<Supply>, DomainError> {
        Ok(self
            .supplies_of(profile)
            .await?
            .into_iter()
            .rev()
            .find(Supply::is_active))
    }

    /// The most recently created supply of the profile, in any status.
    pub async fn last_supply(&self, profile: ProfileId) -> Result<Option<Supply>, DomainError> {
        Ok(self.supplies_of(profile).await?.pop())
    }

    /// Returns true if the order-line sits in a package with a non-Error status.
    ///
    /// Walks the log newest first and decodes one snapshot per package,
    /// stopping at the first package that holds the line.
    pub async fn is_order_line_packaged(
        &self,
        order: OrderId,
        line: OrderLineId,
    ) -> Result<bool, DomainError> {
        let envelopes = self.store.events_of_type(Package::aggregate_type()).await?;

        let mut checked = HashSet::new();
        for envelope in envelopes.into_iter().rev() {
            if !checked.insert(envelope.aggregate_id) {
                continue;
            }
            let package = replay::<Package>([envelope])?;
            if package.holds_order_line(order, line) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn packages_in_supply(
        &self,
        supply: AggregateId,
    ) -> Result<Vec<Package>, DomainError> {
        Ok(self
            .packages()
            .await?
            .into_iter()
            .filter(|package| package.supply_id() == Some(supply))
            .collect())
    }

    /// Packages of the supply whose print flag is still false.
    pub async fn unprinted_packages(
        &self,
        supply: AggregateId,
    ) -> Result<Vec<Package>, DomainError> {
        Ok(self
            .packages_in_supply(supply)
            .await?
            .into_iter()
            .filter(|package| !package.is_printed())
            .collect())
    }

    pub async fn packages_with_order(&self, order: OrderId) -> Result<Vec<Package>, DomainError> {
        Ok(self
            .packages()
            .await?
            .into_iter()
            .filter(|package| package.contains_order(order))
            .collect())
    }

    /// Number of package order-lines across all packages of the supply.
    pub async fn supply_line_count(&self, supply: AggregateId) -> Result<u32, DomainError> {
        Ok(self
            .packages_in_supply(supply)
            .await?
            .iter()
            .map(|package| package.orders().len() as u32)
            .sum())
    }
}
