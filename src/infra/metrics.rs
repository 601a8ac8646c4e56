//! Lock-free poll counters and periodic reporting
//!
//! All counters are statistical, updated with Relaxed atomics; do not use
//! them for coordination. `report()` loads a snapshot and logs it.

use crate::domain::parcel::RefreshOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

pub struct Metrics {
    commands_total: AtomicU64,
    refreshes_updated: AtomicU64,
    refreshes_no_shipments: AtomicU64,
    refreshes_failed: AtomicU64,
    /// Rate-limited by cadence or collapsed into an in-flight refresh
    refreshes_skipped: AtomicU64,
    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            commands_total: AtomicU64::new(0),
            refreshes_updated: AtomicU64::new(0),
            refreshes_no_shipments: AtomicU64::new(0),
            refreshes_failed: AtomicU64::new(0),
            refreshes_skipped: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn record_command(&self) {
        self.commands_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self, outcome: RefreshOutcome) {
        let counter = match outcome {
            RefreshOutcome::Updated => &self.refreshes_updated,
            RefreshOutcome::NoShipments => &self.refreshes_no_shipments,
            RefreshOutcome::Failed => &self.refreshes_failed,
            RefreshOutcome::InFlight => &self.refreshes_skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_skipped(&self) {
        self.refreshes_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSummary {
        MetricsSummary {
            uptime_secs: self.started_at.elapsed().as_secs(),
            commands_total: self.commands_total.load(Ordering::Relaxed),
            refreshes_updated: self.refreshes_updated.load(Ordering::Relaxed),
            refreshes_no_shipments: self.refreshes_no_shipments.load(Ordering::Relaxed),
            refreshes_failed: self.refreshes_failed.load(Ordering::Relaxed),
            refreshes_skipped: self.refreshes_skipped.load(Ordering::Relaxed),
            tracked_packages: 0,
        }
    }

    /// Snapshot with the current registry size filled in
    pub fn report(&self, tracked_packages: usize) -> MetricsSummary {
        MetricsSummary { tracked_packages, ..self.snapshot() }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub commands_total: u64,
    pub refreshes_updated: u64,
    pub refreshes_no_shipments: u64,
    pub refreshes_failed: u64,
    pub refreshes_skipped: u64,
    pub tracked_packages: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = %self.uptime_secs,
            tracked = %self.tracked_packages,
            commands = %self.commands_total,
            updated = %self.refreshes_updated,
            no_shipments = %self.refreshes_no_shipments,
            failed = %self.refreshes_failed,
            skipped = %self.refreshes_skipped,
            "metrics_summary"
        );
    }
}
