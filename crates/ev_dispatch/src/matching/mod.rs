pub mod algorithm;
pub mod types;
pub mod nearest;
pub mod battery_weighted;

pub use algorithm::{preferred_candidates, VehicleMatcher};
pub use types::MatchOutcome;
pub use nearest::NearestMatching;
pub use battery_weighted::BatteryWeightedMatching;
