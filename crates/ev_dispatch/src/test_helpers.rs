//! Test helpers for common test setup and utilities.
//!
//! Shared fixtures for unit tests, integration tests and benches: fixed
//! timestamps, well-known Delhi coordinates and small model artifacts.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::clock::FixedClock;
use crate::features::FeatureName;
use crate::geo::Coordinate;
use crate::model::{FeatureScaler, LinearRegressor, ModelArtifact};
use crate::rides::RideRequest;

/// Connaught Place; also where seed vehicle D001 starts.
pub const CONNAUGHT_PLACE: Coordinate = Coordinate::new(28.6139, 77.2090);

/// About 4.5 km north-east of Connaught Place; seed vehicle D004 starts here.
pub const CIVIL_LINES: Coordinate = Coordinate::new(28.6500, 77.2300);

/// A Wednesday.
pub const TEST_WEDNESDAY: (i32, u32, u32) = (2024, 5, 8);

/// A Sunday.
pub const TEST_SUNDAY: (i32, u32, u32) = (2024, 5, 12);

/// Timestamp at `hour:00:00` on the given date.
///
/// # Panics
///
/// Panics if the date or hour is invalid.
pub fn timestamp(date: (i32, u32, u32), hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(date.0, date.1, date.2)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid test timestamp")
}

/// Clock pinned to Wednesday at `hour`.
pub fn weekday_clock(hour: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(timestamp(TEST_WEDNESDAY, hour)))
}

/// Clock pinned to Sunday at `hour`.
pub fn weekend_clock(hour: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(timestamp(TEST_SUNDAY, hour)))
}

/// Connaught Place to Civil Lines with default request fields.
pub fn test_request(rider_id: &str) -> RideRequest {
    RideRequest::new(rider_id, CONNAUGHT_PLACE, CIVIL_LINES)
}

/// Unscaled linear model `intercept + per_km * distance_km`.
pub fn linear_distance_artifact(intercept: f64, per_km: f64) -> ModelArtifact {
    ModelArtifact::new(
        vec![FeatureName::DistanceKm],
        FeatureScaler::identity(1),
        Box::new(LinearRegressor {
            intercept,
            coefficients: vec![per_km],
        }),
    )
}

/// Artifact JSON over the full standard feature list with a linear model that
/// only reads distance and surge: `20 + 10 * distance + 30 * surge`.
pub fn standard_artifact_json() -> String {
    let columns = FeatureName::standard();
    let n = columns.len();
    let coefficients: Vec<f64> = columns
        .iter()
        .map(|name| match name {
            FeatureName::DistanceKm => 10.0,
            FeatureName::SurgeMultiplier => 30.0,
            _ => 0.0,
        })
        .collect();
    serde_json::json!({
        "feature_columns": columns,
        "scaler": {"mean": vec![0.0; n], "scale": vec![1.0; n]},
        "regressor": {"kind": "linear", "intercept": 20.0, "coefficients": coefficients},
        "is_fitted": true,
        "trained_at": "2024-05-01T10:00:00Z"
    })
    .to_string()
}
