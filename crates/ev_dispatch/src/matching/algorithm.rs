use crate::fleet::{Vehicle, VehicleType};
use crate::geo::{Coordinate, DistanceMetric};

use super::types::MatchOutcome;

/// Trait for matching algorithms that pick one vehicle for a pickup.
pub trait VehicleMatcher: Send + Sync {
    /// Find the best vehicle among `candidates`, or `None` when there are none.
    ///
    /// `candidates` are already filtered for availability and charge. A
    /// `vehicle_type` preference is soft: it narrows the set only when at least
    /// one candidate has that type.
    fn find_match(
        &self,
        pickup: Coordinate,
        candidates: &[&Vehicle],
        vehicle_type: Option<&VehicleType>,
        distance: &dyn DistanceMetric,
    ) -> Option<MatchOutcome>;
}

/// Candidates of the preferred type, or all of them when none has it.
pub fn preferred_candidates<'a>(
    candidates: &[&'a Vehicle],
    vehicle_type: Option<&VehicleType>,
) -> Vec<&'a Vehicle> {
    if let Some(wanted) = vehicle_type {
        let subset: Vec<&Vehicle> = candidates
            .iter()
            .copied()
            .filter(|v| &v.vehicle_type == wanted)
            .collect();
        if !subset.is_empty() {
            return subset;
        }
    }
    candidates.to_vec()
}

/// Lowest-cost vehicle; the first one wins a tie.
pub(super) fn select_min_cost<F>(
    pickup: Coordinate,
    candidates: &[&Vehicle],
    distance: &dyn DistanceMetric,
    cost: F,
) -> Option<MatchOutcome>
where
    F: Fn(&Vehicle, f64) -> f64,
{
    let mut best_match: Option<(&Vehicle, f64, f64)> = None;

    for &vehicle in candidates {
        let pickup_distance_km = distance.distance_km(pickup, vehicle.location);
        let score = cost(vehicle, pickup_distance_km);

        match best_match {
            None => best_match = Some((vehicle, pickup_distance_km, score)),
            Some((_, _, best_score)) if score < best_score => {
                best_match = Some((vehicle, pickup_distance_km, score))
            }
            _ => {}
        }
    }

    best_match.map(|(vehicle, pickup_distance_km, score)| MatchOutcome {
        vehicle_id: vehicle.id.clone(),
        pickup_distance_km,
        score,
    })
}
