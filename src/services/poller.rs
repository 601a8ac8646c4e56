//! Poll engine - periodic refresh of every registered entity
//!
//! Drives each entity's refresh at a fixed cadence. The `due` check on the
//! entity coalesces with manually triggered refreshes (a package registered
//! just before a tick is not refreshed twice), and the per-entity refresh
//! guard keeps at most one refresh in flight. There is no cancellation: an
//! entity unregistered mid-refresh finishes writing state that is then
//! discarded with the entity.

use crate::infra::metrics::Metrics;
use crate::io::carrier::CarrierClient;
use crate::services::registry::ParcelRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info};

pub struct Poller {
    registry: Arc<ParcelRegistry>,
    client: Arc<CarrierClient>,
    metrics: Arc<Metrics>,
    cadence: Duration,
}

impl Poller {
    pub fn new(
        registry: Arc<ParcelRegistry>,
        client: Arc<CarrierClient>,
        metrics: Arc<Metrics>,
        cadence: Duration,
    ) -> Self {
        Self { registry, client, metrics, cadence }
    }

    /// Run until shutdown. The first tick fires immediately, giving
    /// restored entities their initial refresh.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(cadence_secs = self.cadence.as_secs(), "poller_started");

        let mut tick = interval(self.cadence);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.poll_due();
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("poller_shutdown");
                        return;
                    }
                }
            }
        }
    }

    /// Spawn a refresh for every entity whose cadence has elapsed
    pub(crate) fn poll_due(&self) {
        let parcels = self.registry.snapshot();
        debug!(count = parcels.len(), "poll_tick");

        for parcel in parcels {
            if !parcel.due(self.cadence) {
                self.metrics.record_refresh_skipped();
                continue;
            }

            let client = self.client.clone();
            let metrics = self.metrics.clone();
            tokio::spawn(async move {
                let outcome = parcel.refresh(&client).await;
                metrics.record_refresh(outcome);
            });
        }
    }
}
