//! Ride requests, ride records and the ride lifecycle.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::context::{CongestionLevel, TimeOfDay};
use crate::fleet::{VehicleId, VehicleType};
use crate::geo::Coordinate;

pub const DEFAULT_CITY: &str = "Delhi";
pub const DEFAULT_USER_TYPE: &str = "regular";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RideId(String);

impl RideId {
    /// `RIDE_{sequence}_{YYYYmmddHHMMSS}`.
    pub fn generate(sequence: u64, created_at: NaiveDateTime) -> Self {
        Self(format!(
            "RIDE_{sequence}_{}",
            created_at.format("%Y%m%d%H%M%S")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RideId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle: `Pending -> Accepted -> Completed`, with `Pending -> Completed`
/// also allowed. There is no cancelled or failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RideStatus {
    Pending,
    Accepted,
    Completed,
}

impl RideStatus {
    pub fn can_transition_to(self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (RideStatus::Pending, RideStatus::Accepted)
                | (RideStatus::Pending, RideStatus::Completed)
                | (RideStatus::Accepted, RideStatus::Completed)
        )
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: &'static str = self.into();
        f.write_str(label)
    }
}

/// Which predictor path priced the ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FareSource {
    Model,
    Fallback,
}

/// A rider's booking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequest {
    pub rider_id: String,
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
    #[serde(default = "default_city")]
    pub city: String,
    /// Soft preference; ignored when no candidate has this type.
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: Option<VehicleType>,
    #[serde(default = "default_user_type")]
    pub user_type: String,
    /// Overrides the derived time-of-day label for the model input only.
    #[serde(default)]
    pub time_of_day: Option<TimeOfDay>,
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

fn default_vehicle_type() -> Option<VehicleType> {
    Some(VehicleType::Sedan)
}

fn default_user_type() -> String {
    DEFAULT_USER_TYPE.to_string()
}

impl RideRequest {
    pub fn new(rider_id: impl Into<String>, pickup: Coordinate, dropoff: Coordinate) -> Self {
        Self {
            rider_id: rider_id.into(),
            pickup,
            dropoff,
            city: default_city(),
            vehicle_type: default_vehicle_type(),
            user_type: default_user_type(),
            time_of_day: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn with_vehicle_type(mut self, vehicle_type: impl Into<VehicleType>) -> Self {
        self.vehicle_type = Some(vehicle_type.into());
        self
    }

    pub fn without_vehicle_preference(mut self) -> Self {
        self.vehicle_type = None;
        self
    }

    pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = user_type.into();
        self
    }

    pub fn with_time_of_day(mut self, time_of_day: TimeOfDay) -> Self {
        self.time_of_day = Some(time_of_day);
        self
    }
}

/// A booked ride. Owned by the orchestrator's ride registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRecord {
    pub id: RideId,
    pub rider_id: String,
    pub vehicle_id: VehicleId,
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
    /// Pickup, midpoint, dropoff.
    pub route: Vec<Coordinate>,
    pub fare: f64,
    /// `fare / surge_multiplier`.
    pub base_fare: f64,
    pub surge_multiplier: f64,
    pub fare_source: FareSource,
    pub distance_km: f64,
    /// Distance from the matched vehicle to the pickup point.
    pub pickup_distance_km: f64,
    pub duration_minutes: f64,
    pub demand_factor: f64,
    pub congestion: CongestionLevel,
    pub time_of_day: TimeOfDay,
    pub status: RideStatus,
    pub created_at: NaiveDateTime,
    pub accepted_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

/// Registry-wide ride statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RideStats {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub completed: usize,
    pub available_vehicles: usize,
    /// Mean fare over completed rides, 0 when none completed.
    pub avg_fare: f64,
    /// Mean trip distance over completed rides, 0 when none completed.
    pub avg_distance_km: f64,
}

impl RideStats {
    pub fn add_ride(&mut self, status: RideStatus) {
        self.total += 1;
        match status {
            RideStatus::Pending => self.pending += 1,
            RideStatus::Accepted => self.accepted += 1,
            RideStatus::Completed => self.completed += 1,
        }
    }
}
