//! Telemetry / KPIs: running counters for the dispatch service.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::DispatchError;
use crate::pricing::FarePrediction;

/// Lock-free counters updated on every request. Read with [`Self::snapshot`].
#[derive(Debug, Default)]
pub struct DispatchTelemetry {
    rides_requested: AtomicU64,
    rides_booked: AtomicU64,
    rejected_no_vehicles: AtomicU64,
    rejected_no_match: AtomicU64,
    fares_predicted: AtomicU64,
    fares_fallback: AtomicU64,
    unseen_categories: AtomicU64,
    rides_accepted: AtomicU64,
    rides_completed: AtomicU64,
    location_updates: AtomicU64,
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub rides_requested: u64,
    pub rides_booked: u64,
    pub rejected_no_vehicles: u64,
    pub rejected_no_match: u64,
    pub fares_predicted: u64,
    pub fares_fallback: u64,
    pub unseen_categories: u64,
    pub rides_accepted: u64,
    pub rides_completed: u64,
    pub location_updates: u64,
}

impl TelemetrySnapshot {
    /// Share of booked fares that came from the formula instead of the model.
    pub fn fallback_rate(&self) -> f64 {
        let priced = self.fares_predicted + self.fares_fallback;
        if priced == 0 {
            0.0
        } else {
            self.fares_fallback as f64 / priced as f64
        }
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl DispatchTelemetry {
    pub fn record_request(&self) {
        bump(&self.rides_requested);
    }

    pub fn record_rejection(&self, err: &DispatchError) {
        match err {
            DispatchError::NoVehiclesAvailable => bump(&self.rejected_no_vehicles),
            DispatchError::NoMatch => bump(&self.rejected_no_match),
            _ => {}
        }
    }

    pub fn record_booking(&self, prediction: &FarePrediction, unseen_categories: usize) {
        bump(&self.rides_booked);
        if prediction.is_fallback() {
            bump(&self.fares_fallback);
        } else {
            bump(&self.fares_predicted);
        }
        self.unseen_categories
            .fetch_add(unseen_categories as u64, Ordering::Relaxed);
    }

    pub fn record_accept(&self) {
        bump(&self.rides_accepted);
    }

    pub fn record_complete(&self) {
        bump(&self.rides_completed);
    }

    pub fn record_location_update(&self) {
        bump(&self.location_updates);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let read = |c: &AtomicU64| c.load(Ordering::Relaxed);
        TelemetrySnapshot {
            rides_requested: read(&self.rides_requested),
            rides_booked: read(&self.rides_booked),
            rejected_no_vehicles: read(&self.rejected_no_vehicles),
            rejected_no_match: read(&self.rejected_no_match),
            fares_predicted: read(&self.fares_predicted),
            fares_fallback: read(&self.fares_fallback),
            unseen_categories: read(&self.unseen_categories),
            rides_accepted: read(&self.rides_accepted),
            rides_completed: read(&self.rides_completed),
            location_updates: read(&self.location_updates),
        }
    }
}
