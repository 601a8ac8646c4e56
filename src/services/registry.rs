//! Entity registry and host interface
//!
//! The host owns entity lifecycle: it receives new entities in batches and
//! removes them by display handle. `ParcelRegistry` is the in-process
//! implementation used by the binary; the trait is the seam the command
//! handlers are written against.

use crate::domain::parcel::TrackedParcel;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Capability set the host exposes to the command handlers
#[async_trait]
pub trait EntityHost: Send + Sync {
    /// Hand a batch of new entities to the host for scheduling and display.
    async fn add_parcels(&self, parcels: Vec<Arc<TrackedParcel>>);

    /// Remove the entity addressed by `handle`. Returns whether one existed.
    async fn remove_by_handle(&self, handle: &str) -> bool;
}

/// In-process entity registry, keyed by display handle
#[derive(Default)]
pub struct ParcelRegistry {
    parcels: RwLock<HashMap<String, Arc<TrackedParcel>>>,
}

impl ParcelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities currently registered, for the poll engine to iterate.
    ///
    /// A snapshot: an entity unregistered after the snapshot may still see
    /// one last refresh, whose result is simply no longer referenced.
    pub fn snapshot(&self) -> Vec<Arc<TrackedParcel>> {
        self.parcels.read().values().cloned().collect()
    }

    pub fn get(&self, handle: &str) -> Option<Arc<TrackedParcel>> {
        self.parcels.read().get(handle).cloned()
    }

    pub fn len(&self) -> usize {
        self.parcels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.read().is_empty()
    }
}

#[async_trait]
impl EntityHost for ParcelRegistry {
    async fn add_parcels(&self, parcels: Vec<Arc<TrackedParcel>>) {
        let mut map = self.parcels.write();
        for parcel in parcels {
            debug!(handle = %parcel.handle(), "entity_added");
            map.insert(parcel.handle(), parcel);
        }
    }

    async fn remove_by_handle(&self, handle: &str) -> bool {
        let removed = self.parcels.write().remove(handle).is_some();
        if removed {
            info!(handle = %handle, "entity_removed");
        } else {
            debug!(handle = %handle, "entity_remove_missed");
        }
        removed
    }
}
