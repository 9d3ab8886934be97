use serde::{Deserialize, Serialize};

use crate::context::CongestionLevel;
use crate::geo::round2;

/// Assumed average city speed per congestion level, used for trip duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CongestionSpeeds {
    pub high_kmh: f64,
    pub medium_kmh: f64,
    pub low_kmh: f64,
}

impl Default for CongestionSpeeds {
    fn default() -> Self {
        Self {
            high_kmh: 20.0,
            medium_kmh: 25.0,
            low_kmh: 35.0,
        }
    }
}

impl CongestionSpeeds {
    pub fn speed_kmh(&self, congestion: CongestionLevel) -> f64 {
        match congestion {
            CongestionLevel::High => self.high_kmh,
            CongestionLevel::Medium => self.medium_kmh,
            CongestionLevel::Low => self.low_kmh,
        }
    }

    /// Trip duration in minutes, rounded to two decimals.
    pub fn estimated_duration_minutes(&self, distance_km: f64, congestion: CongestionLevel) -> f64 {
        let speed = self.speed_kmh(congestion).max(1.0);
        round2(distance_km / speed * 60.0)
    }
}

/// Duration with the default speed table.
pub fn estimated_duration(distance_km: f64, congestion: CongestionLevel) -> f64 {
    CongestionSpeeds::default().estimated_duration_minutes(distance_km, congestion)
}
