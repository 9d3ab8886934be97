mod support;

use std::sync::Arc;

use ev_dispatch::config::ServiceConfig;
use ev_dispatch::features::{FeatureName, FeatureSignals};
use ev_dispatch::fleet::synthetic_fleet;
use ev_dispatch::model::ModelArtifact;
use ev_dispatch::pricing::{FarePredictor, PricingConfig};
use ev_dispatch::rides::FareSource;
use ev_dispatch::service::RideService;
use ev_dispatch::test_helpers::{
    linear_distance_artifact, standard_artifact_json, test_request, weekday_clock, weekend_clock,
};
use support::service::ServiceBuilder;
use test_log::test;

const ENCODERS_JSON: &str = r#"{
    "city": ["Bangalore", "Delhi", "Mumbai"],
    "traffic_level": ["high", "low", "medium"],
    "vehicle_type": ["hatchback", "sedan", "suv"],
    "time_of_day": ["afternoon", "evening", "morning", "night"],
    "weather_condition": ["clear", "rain"],
    "user_type": ["premium", "regular"]
}"#;

#[test]
fn fallback_formula_matches_reference_fare() {
    let signals = FeatureSignals::new()
        .with(FeatureName::DistanceKm, 10.0)
        .with(FeatureName::SurgeMultiplier, 1.5);
    assert_eq!(FarePredictor::default().predict_fare(&signals), 240.0);
    assert_eq!(
        FarePredictor::new(PricingConfig::default()).predict_fare(&signals),
        240.0
    );
}

#[test]
fn service_loads_artifacts_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let model_path = dir.path().join("fare_model.json");
    let encoders_path = dir.path().join("label_encoders.json");
    std::fs::write(&model_path, standard_artifact_json()).expect("write model");
    std::fs::write(&encoders_path, ENCODERS_JSON).expect("write encoders");

    let config = ServiceConfig::default()
        .with_model_path(&model_path)
        .with_label_encoders_path(&encoders_path);
    let service = RideService::from_config(config)
        .expect("service")
        .with_clock(weekday_clock(9));

    let status = service.model_status();
    assert!(status.model_loaded);
    assert!(status.model_fitted);
    assert!(status.encoders_loaded);
    assert_eq!(status.feature_count, FeatureName::standard().len());
    assert!(status.trained_at.is_some());

    let ride = service.request_ride(test_request("U1")).expect("booked");
    assert_eq!(ride.fare_source, FareSource::Model);
    let expected = 20.0 + 10.0 * ride.distance_km + 30.0 * 1.5;
    assert!((ride.fare - expected).abs() < 1e-9, "fare {} vs {expected}", ride.fare);

    let telemetry = service.telemetry();
    assert_eq!(telemetry.fares_predicted, 1);
    assert_eq!(telemetry.unseen_categories, 0);
}

#[test]
fn supplied_fleet_still_loads_configured_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let model_path = dir.path().join("fare_model.json");
    std::fs::write(&model_path, standard_artifact_json()).expect("write model");

    let config = ServiceConfig::default().with_model_path(&model_path);
    let service = RideService::from_config_with_fleet(
        synthetic_fleet(30, 5, Default::default()),
        config,
    )
    .with_clock(weekday_clock(9));

    let status = service.model_status();
    assert!(status.model_loaded);
    assert_eq!(status.total_vehicles, 30);

    let ride = service.request_ride(test_request("U1")).expect("booked");
    assert_eq!(ride.fare_source, FareSource::Model);
    assert_eq!(service.telemetry().fallback_rate(), 0.0);
}

#[test]
fn broken_model_file_degrades_to_formula() {
    let dir = tempfile::tempdir().expect("tempdir");
    let model_path = dir.path().join("fare_model.json");
    std::fs::write(&model_path, r#"{"feature_columns": ["distance_km"]}"#).expect("write");

    let service = RideService::from_config(
        ServiceConfig::default()
            .with_model_path(&model_path)
            .with_label_encoders_path(dir.path().join("missing.json")),
    )
    .expect("service")
    .with_clock(weekday_clock(9));

    let status = service.model_status();
    assert!(!status.model_loaded);
    assert!(!status.encoders_loaded);

    let ride = service.request_ride(test_request("U1")).expect("booked");
    assert_eq!(ride.fare_source, FareSource::Fallback);
    let expected = (40.0 + 12.0 * ride.distance_km) * ride.surge_multiplier;
    assert!((ride.fare - expected).abs() < 1e-9);
}

#[test]
fn model_fares_never_drop_below_floor() {
    let service = ServiceBuilder::new()
        .model(linear_distance_artifact(-1_000.0, 1.0))
        .build();

    let ride = service.request_ride(test_request("U1")).expect("booked");
    assert_eq!(ride.fare_source, FareSource::Model);
    assert_eq!(ride.fare, 40.0);
}

#[test]
fn unfitted_model_uses_fallback_and_counts_it() {
    let service = ServiceBuilder::new()
        .model(linear_distance_artifact(100.0, 10.0).with_fitted(false))
        .build();

    let ride = service.request_ride(test_request("U1")).expect("booked");
    assert_eq!(ride.fare_source, FareSource::Fallback);
    assert_eq!(service.telemetry().fares_fallback, 1);
    assert_eq!(service.telemetry().fallback_rate(), 1.0);
}

#[test]
fn unseen_city_is_encoded_but_still_priced() {
    let service = ServiceBuilder::new()
        .model(ModelArtifact::from_json(&standard_artifact_json()).expect("artifact"))
        .encoders(ev_dispatch::encoding::LabelEncoders::from_json(ENCODERS_JSON).expect("encoders"))
        .build();

    let ride = service
        .request_ride(test_request("U1").with_city("Chennai"))
        .expect("booked");
    assert_eq!(ride.fare_source, FareSource::Model);
    assert_eq!(service.telemetry().unseen_categories, 1);
}

#[test]
fn surge_follows_the_clock() {
    let rush = ServiceBuilder::new().clock(weekday_clock(9)).build();
    let sunday_noon = ServiceBuilder::new().clock(weekend_clock(12)).build();

    let peak = rush.request_ride(test_request("U1")).expect("peak");
    let quiet = sunday_noon.request_ride(test_request("U1")).expect("quiet");

    assert_eq!(peak.surge_multiplier, 1.5);
    assert_eq!(quiet.surge_multiplier, 1.1);
    assert_eq!(peak.distance_km, quiet.distance_km);
    assert!(peak.fare > quiet.fare);
    assert!((peak.base_fare - quiet.base_fare).abs() < 1e-9);
}

#[test]
fn fleet_file_replaces_seed_fleet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fleet_path = dir.path().join("fleet.json");
    let fleet = synthetic_fleet(25, 11, Default::default());
    std::fs::write(&fleet_path, serde_json::to_string(&fleet).expect("json")).expect("write");

    let service = RideService::from_config(ServiceConfig::default().with_fleet_path(&fleet_path))
        .expect("service");
    assert_eq!(service.model_status().total_vehicles, 25);

    let missing = RideService::from_config(
        ServiceConfig::default().with_fleet_path(dir.path().join("nope.json")),
    );
    assert!(missing.is_err());
}

#[test]
fn shared_artifact_serves_several_services() {
    let artifact = Arc::new(linear_distance_artifact(50.0, 10.0));
    let a = RideService::new(ev_dispatch::fleet::seed_fleet(), ServiceConfig::default())
        .with_model(Arc::clone(&artifact))
        .with_clock(weekday_clock(14));
    let b = RideService::new(ev_dispatch::fleet::seed_fleet(), ServiceConfig::default())
        .with_model(artifact)
        .with_clock(weekday_clock(14));

    let ra = a.request_ride(test_request("U1")).expect("a");
    let rb = b.request_ride(test_request("U1")).expect("b");
    assert_eq!(ra.fare, rb.fare);
    assert!((ra.fare - (50.0 + 10.0 * ra.distance_km)).abs() < 1e-9);
}
