//! Periodic repair of supply totals whose package message was lost.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use domain::{Aggregate, Ledger, Package, Supply};
use event_store::EventStore;

use crate::config::Config;
use crate::dispatcher::MessageDispatcher;
use crate::error::Result;
use crate::messages::PackageMessage;

/// Compares every active supply's stored total with its line count and
/// re-dispatches a package message for each supply that drifted.
///
/// Assignment commits the package before dispatching, so a failed dispatch
/// leaves the total stale until a sweep picks it up.
pub struct TotalSweep<S: EventStore> {
    ledger: Ledger<S>,
    dispatcher: Arc<dyn MessageDispatcher>,
    transport: String,
}

impl<S: EventStore> TotalSweep<S> {
    pub fn new(store: S, dispatcher: Arc<dyn MessageDispatcher>, config: &Config) -> Self {
        Self {
            ledger: Ledger::new(store),
            dispatcher,
            transport: config.package_transport.clone(),
        }
    }

    /// Returns the number of messages dispatched.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self) -> Result<usize> {
        let packages = self.ledger.packages().await?;
        let mut dispatched = 0;

        for supply in self.ledger.supplies().await? {
            if !supply.is_active() {
                continue;
            }
            let Some(message) = drift_message(&supply, &packages) else {
                continue;
            };

            self.dispatcher
                .dispatch(message.into(), &self.transport)
                .await?;
            dispatched += 1;
        }

        if dispatched > 0 {
            metrics::counter!("packaging_sweep_dispatches_total").increment(dispatched as u64);
        }
        Ok(dispatched)
    }

    /// Sweeps right away and then every `period` until `shutdown` resolves.
    pub async fn run_every<F>(&self, period: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(period);
        tracing::info!(period_secs = period.as_secs(), "total sweep started");

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.sweep().await {
                        tracing::warn!(error = %err, kind = err.kind().as_str(), "total sweep failed");
                    }
                }
            }
        }

        tracing::info!("total sweep stopped");
    }
}

/// A message for the newest package of the supply, if its total drifted.
fn drift_message(supply: &Supply, packages: &[Package]) -> Option<PackageMessage> {
    let supply_id = supply.id()?;
    let in_supply: Vec<&Package> = packages
        .iter()
        .filter(|package| package.supply_id() == Some(supply_id))
        .collect();

    let counted: u32 = in_supply
        .iter()
        .map(|package| package.orders().len() as u32)
        .sum();
    if counted == supply.total() {
        return None;
    }

    let package = in_supply.last()?;
    tracing::info!(%supply_id, stored = supply.total(), counted, "supply total drifted");
    Some(PackageMessage {
        package_id: package.id()?,
        event: package.current_event_id()?,
        last: None,
    })
}
