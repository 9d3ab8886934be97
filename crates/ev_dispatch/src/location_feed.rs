//! Background consumer of vehicle location pushes.
//!
//! Updates arrive on a bounded channel and are applied on a dedicated thread,
//! one short registry write each. [`LocationFeed::push`] never blocks: when the
//! queue is full the update is dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fleet::VehicleId;
use crate::geo::Coordinate;
use crate::service::RideService;

/// Queued updates per feed before `push` starts dropping.
pub const DEFAULT_FEED_CAPACITY: usize = 1_024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub vehicle_id: VehicleId,
    pub location: Coordinate,
}

impl LocationUpdate {
    pub fn new(vehicle_id: impl Into<String>, location: Coordinate) -> Self {
        Self {
            vehicle_id: VehicleId::new(vehicle_id),
            location,
        }
    }
}

/// Counts reported when the feed shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub applied: u64,
    pub unknown_vehicle: u64,
    /// Pushed while the queue was full.
    pub dropped: u64,
}

pub struct LocationFeed {
    sender: SyncSender<LocationUpdate>,
    handle: JoinHandle<FeedSummary>,
    dropped: AtomicU64,
}

impl LocationFeed {
    /// Start the consumer thread with [`DEFAULT_FEED_CAPACITY`]. It runs until
    /// every sender is dropped.
    pub fn spawn(service: Arc<RideService>) -> Self {
        Self::with_capacity(service, DEFAULT_FEED_CAPACITY)
    }

    pub fn with_capacity(service: Arc<RideService>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<LocationUpdate>(capacity);
        let handle = std::thread::spawn(move || {
            let mut summary = FeedSummary::default();
            for update in receiver {
                match service.update_vehicle_location(&update.vehicle_id, update.location) {
                    Ok(_) => summary.applied += 1,
                    Err(err) => {
                        debug!(vehicle = %update.vehicle_id, error = %err, "dropping location update");
                        summary.unknown_vehicle += 1;
                    }
                }
            }
            summary
        });
        Self {
            sender,
            handle,
            dropped: AtomicU64::new(0),
        }
    }

    /// Extra producer handle for other threads. Its `send` waits for room in
    /// the queue; use `try_send` to drop instead.
    pub fn sender(&self) -> SyncSender<LocationUpdate> {
        self.sender.clone()
    }

    /// Queue one update without blocking. Returns false when the update was
    /// dropped, either because the queue is full or the consumer has stopped.
    pub fn push(&self, update: LocationUpdate) -> bool {
        match self.sender.try_send(update) {
            Ok(()) => true,
            Err(TrySendError::Full(update)) => {
                debug!(vehicle = %update.vehicle_id, "location feed full, dropping update");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Close this handle's sender and wait for the queue to drain. Blocks while
    /// clones from [`Self::sender`] are still alive.
    pub fn shutdown(self) -> FeedSummary {
        drop(self.sender);
        let mut summary = self.handle.join().unwrap_or_default();
        summary.dropped = self.dropped.into_inner();
        summary
    }
}
