use crate::fleet::VehicleId;

/// The vehicle a matcher selected for a pickup.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub vehicle_id: VehicleId,
    /// Distance from the vehicle to the pickup point.
    pub pickup_distance_km: f64,
    /// Matcher-specific cost; lower is better.
    pub score: f64,
}
