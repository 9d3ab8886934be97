use crate::fleet::{Vehicle, VehicleType};
use crate::geo::{Coordinate, DistanceMetric};

use super::algorithm::{preferred_candidates, select_min_cost, VehicleMatcher};
use super::types::MatchOutcome;

/// Closest vehicle to the pickup, ignoring charge.
///
/// Baseline for comparing against [`super::BatteryWeightedMatching`].
#[derive(Debug, Default)]
pub struct NearestMatching;

impl VehicleMatcher for NearestMatching {
    fn find_match(
        &self,
        pickup: Coordinate,
        candidates: &[&Vehicle],
        vehicle_type: Option<&VehicleType>,
        distance: &dyn DistanceMetric,
    ) -> Option<MatchOutcome> {
        let pool = preferred_candidates(candidates, vehicle_type);
        select_min_cost(pickup, &pool, distance, |_, pickup_distance_km| pickup_distance_km)
    }
}
