use crate::fleet::{Vehicle, VehicleType};
use crate::geo::{Coordinate, DistanceMetric};

use super::algorithm::{preferred_candidates, select_min_cost, VehicleMatcher};
use super::types::MatchOutcome;

/// Scores each vehicle by pickup distance plus a penalty for missing charge:
/// `distance_km + (100 - battery_percent) / battery_divisor`. Lowest score wins.
#[derive(Debug)]
pub struct BatteryWeightedMatching {
    /// Battery points that cost as much as one kilometre of pickup distance.
    pub battery_divisor: f64,
}

impl BatteryWeightedMatching {
    pub fn new(battery_divisor: f64) -> Self {
        Self { battery_divisor }
    }

    fn score(&self, vehicle: &Vehicle, pickup_distance_km: f64) -> f64 {
        pickup_distance_km + (100.0 - vehicle.battery_percent) / self.battery_divisor
    }
}

impl Default for BatteryWeightedMatching {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl VehicleMatcher for BatteryWeightedMatching {
    fn find_match(
        &self,
        pickup: Coordinate,
        candidates: &[&Vehicle],
        vehicle_type: Option<&VehicleType>,
        distance: &dyn DistanceMetric,
    ) -> Option<MatchOutcome> {
        let pool = preferred_candidates(candidates, vehicle_type);
        let outcome = select_min_cost(pickup, &pool, distance, |vehicle, pickup_distance_km| {
            self.score(vehicle, pickup_distance_km)
        });
        if let Some(found) = &outcome {
            tracing::debug!(
                vehicle = %found.vehicle_id,
                pickup_distance_km = found.pickup_distance_km,
                score = found.score,
                "matched vehicle"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Haversine;

    fn vehicle(id: &str, at: Coordinate, battery: f64, vehicle_type: VehicleType) -> Vehicle {
        Vehicle::new(id, id, at, battery, vehicle_type, 4.5)
    }

    #[test]
    fn fuller_battery_wins_at_equal_distance() {
        let spot = Coordinate::new(28.6139, 77.2090);
        let half = vehicle("A", spot, 50.0, VehicleType::Sedan);
        let full = vehicle("B", spot, 100.0, VehicleType::Sedan);
        let candidates = vec![&half, &full];

        let matcher = BatteryWeightedMatching::default();
        let outcome = matcher
            .find_match(spot, &candidates, None, &Haversine)
            .expect("match");

        assert_eq!(outcome.vehicle_id.as_str(), "B");
        assert_eq!(outcome.score, 0.0);
        assert_eq!(matcher.score(&half, 0.0) - outcome.score, 5.0);
    }

    #[test]
    fn ties_keep_iteration_order() {
        let spot = Coordinate::new(28.6139, 77.2090);
        let first = vehicle("D001", spot, 80.0, VehicleType::Sedan);
        let second = vehicle("D002", spot, 80.0, VehicleType::Sedan);

        let outcome = BatteryWeightedMatching::default()
            .find_match(spot, &[&first, &second], None, &Haversine)
            .expect("match");
        assert_eq!(outcome.vehicle_id.as_str(), "D001");
    }

    #[test]
    fn charge_can_outweigh_distance() {
        let pickup = Coordinate::new(28.6139, 77.2090);
        // ~1.1 km away, full battery vs. on the spot at 30%.
        let near_low = vehicle("NEAR", pickup, 30.0, VehicleType::Sedan);
        let far_full = vehicle("FAR", Coordinate::new(28.6239, 77.2090), 100.0, VehicleType::Sedan);

        let outcome = BatteryWeightedMatching::default()
            .find_match(pickup, &[&near_low, &far_full], None, &Haversine)
            .expect("match");
        assert_eq!(outcome.vehicle_id.as_str(), "FAR");
        assert!(outcome.pickup_distance_km > 1.0 && outcome.pickup_distance_km < 1.2);
    }

    #[test]
    fn type_preference_is_soft() {
        let pickup = Coordinate::new(28.6139, 77.2090);
        let sedan = vehicle("S", pickup, 90.0, VehicleType::Sedan);
        let suv = vehicle("U", Coordinate::new(28.70, 77.30), 40.0, VehicleType::Suv);
        let candidates = vec![&sedan, &suv];
        let matcher = BatteryWeightedMatching::default();

        let wanted = matcher
            .find_match(pickup, &candidates, Some(&VehicleType::Suv), &Haversine)
            .expect("match");
        assert_eq!(wanted.vehicle_id.as_str(), "U");

        let unsatisfiable = matcher
            .find_match(pickup, &candidates, Some(&VehicleType::Hatchback), &Haversine)
            .expect("match");
        assert_eq!(unsatisfiable.vehicle_id.as_str(), "S");
    }
}
