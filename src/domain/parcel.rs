//! Tracked parcel entity - live status of one registered package
//!
//! One `TrackedParcel` exists per registered tracking identifier. The
//! entity owns its last-known state behind a lock; `refresh` queries the
//! carrier and replaces the state on success, and absorbs every failure
//! (the prior state is kept and the outcome is logged).

use crate::domain::types::{ShipmentRecord, TrackingId, ICON, STATUS_UNKNOWN};
use crate::io::carrier::CarrierClient;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Result of a single refresh attempt.
///
/// Refresh never propagates an error past its own boundary; the outcome is
/// returned so the poll engine can count it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Carrier returned shipment data; entity state was replaced.
    Updated,
    /// Carrier answered with an empty shipment list; prior state kept.
    NoShipments,
    /// Transport-level failure (timeout, non-2xx, network); prior state kept.
    Failed,
    /// Another refresh for this entity was already in flight.
    InFlight,
}

/// Mutable entity state, written only by `refresh`
#[derive(Debug, Default)]
struct ParcelState {
    status: Option<String>,
    shipment: Option<ShipmentRecord>,
    last_updated: Option<DateTime<Utc>>,
    /// Last refresh attempt, successful or not (throttling input)
    last_attempt: Option<Instant>,
}

/// One tracked parcel, shared between the registry and in-flight refreshes
pub struct TrackedParcel {
    id: TrackingId,
    state: RwLock<ParcelState>,
    /// Serializes refreshes: at most one in flight per entity
    refresh_guard: tokio::sync::Mutex<()>,
}

impl TrackedParcel {
    pub fn new(id: TrackingId) -> Self {
        Self {
            id,
            state: RwLock::new(ParcelState::default()),
            refresh_guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn id(&self) -> &TrackingId {
        &self.id
    }

    pub fn name(&self) -> String {
        self.id.display_name()
    }

    pub fn handle(&self) -> String {
        self.id.handle()
    }

    pub fn icon(&self) -> &'static str {
        ICON
    }

    /// Current status code, `"unknown"` until the first successful refresh
    pub fn status(&self) -> String {
        self.state.read().status.clone().unwrap_or_else(|| STATUS_UNKNOWN.to_string())
    }

    /// Full last-known shipment record (empty mapping before first refresh)
    pub fn attributes(&self) -> ShipmentRecord {
        self.state.read().shipment.clone().unwrap_or_default()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_updated
    }

    /// Whether a refresh attempt is allowed under the given cadence.
    ///
    /// Counts attempts rather than successes, so a failing parcel is not
    /// retried outside the normal poll cadence.
    pub fn due(&self, cadence: Duration) -> bool {
        match self.state.read().last_attempt {
            Some(at) => at.elapsed() >= cadence,
            None => true,
        }
    }

    /// Query the carrier and update entity state.
    ///
    /// All failure paths keep the prior state and log; nothing propagates.
    pub async fn refresh(&self, client: &CarrierClient) -> RefreshOutcome {
        let Ok(_guard) = self.refresh_guard.try_lock() else {
            debug!(package_id = %self.id, "refresh_already_in_flight");
            return RefreshOutcome::InFlight;
        };

        self.state.write().last_attempt = Some(Instant::now());
        debug!(package_id = %self.id, "parcel_refreshing");

        match client.track(&self.id).await {
            Ok(response) => match response.shipments.into_iter().next() {
                Some(shipment) => {
                    let status =
                        shipment.status_code().unwrap_or(STATUS_UNKNOWN).to_string();
                    {
                        let mut state = self.state.write();
                        state.status = Some(status.clone());
                        state.shipment = Some(shipment);
                        state.last_updated = Some(Utc::now());
                    }
                    info!(package_id = %self.id, status = %status, "parcel_updated");
                    RefreshOutcome::Updated
                }
                None => {
                    warn!(package_id = %self.id, "parcel_no_shipment_data");
                    RefreshOutcome::NoShipments
                }
            },
            Err(e) => {
                error!(package_id = %self.id, error = %e, "carrier_request_failed");
                RefreshOutcome::Failed
            }
        }
    }
}
