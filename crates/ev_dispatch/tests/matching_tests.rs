mod support;

use ev_dispatch::config::{MatcherKind, ServiceConfig};
use ev_dispatch::fleet::{Vehicle, VehicleType};
use ev_dispatch::geo::{CachedDistance, Haversine};
use ev_dispatch::matching::{BatteryWeightedMatching, NearestMatching, VehicleMatcher};
use ev_dispatch::test_helpers::{test_request, CONNAUGHT_PLACE};
use support::fleet::VehicleBuilder;
use support::service::ServiceBuilder;

#[test]
fn equal_distance_prefers_fuller_battery_by_five_points() {
    let half = VehicleBuilder::new("A-HALF").battery(50.0).build();
    let full = VehicleBuilder::new("B-FULL").battery(100.0).build();
    let candidates: Vec<&Vehicle> = vec![&half, &full];

    let outcome = BatteryWeightedMatching::default()
        .find_match(CONNAUGHT_PLACE, &candidates, None, &Haversine)
        .expect("match");
    assert_eq!(outcome.vehicle_id.as_str(), "B-FULL");

    let only_half = BatteryWeightedMatching::default()
        .find_match(CONNAUGHT_PLACE, &[&half], None, &Haversine)
        .expect("match");
    assert_eq!(only_half.score - outcome.score, 5.0);
}

#[test]
fn ties_resolve_by_vehicle_id_through_the_registry() {
    // Inserted out of order; the registry iterates by id.
    let service = ServiceBuilder::new()
        .fleet(vec![
            VehicleBuilder::new("D009").battery(80.0).build(),
            VehicleBuilder::new("D002").battery(80.0).build(),
            VehicleBuilder::new("D005").battery(80.0).build(),
        ])
        .build();

    let ride = service.request_ride(test_request("U1")).expect("booked");
    assert_eq!(ride.vehicle_id.as_str(), "D002");
}

#[test]
fn nearest_matcher_from_config_ignores_charge() {
    let fleet = vec![
        VehicleBuilder::new("CLOSE").battery(25.0).build(),
        VehicleBuilder::new("FAR").at(28.64, 77.21).battery(100.0).build(),
    ];

    let weighted = ServiceBuilder::new().fleet(fleet.clone()).build();
    let nearest = ServiceBuilder::new()
        .fleet(fleet)
        .config(ServiceConfig::default().with_matcher(MatcherKind::Nearest))
        .build();

    assert_eq!(
        weighted.request_ride(test_request("U1")).expect("weighted").vehicle_id.as_str(),
        "FAR"
    );
    assert_eq!(
        nearest.request_ride(test_request("U1")).expect("nearest").vehicle_id.as_str(),
        "CLOSE"
    );
}

#[test]
fn preferred_type_is_used_when_available() {
    let service = ServiceBuilder::new().build();
    let ride = service
        .request_ride(test_request("U1").with_vehicle_type(VehicleType::Hatchback))
        .expect("booked");
    assert_eq!(ride.vehicle_id.as_str(), "D003");

    // The only hatchback is taken; the preference falls away.
    let next = service
        .request_ride(test_request("U2").with_vehicle_type(VehicleType::Hatchback))
        .expect("booked");
    assert_ne!(next.vehicle_id.as_str(), "D003");
}

#[test]
fn cached_distance_gives_identical_matches() {
    let plain = ServiceBuilder::new().build();
    let cached = ServiceBuilder::new()
        .build()
        .with_distance_metric(Box::new(CachedDistance::with_capacity(Haversine, 64)));

    for rider in ["U1", "U2", "U3"] {
        let a = plain.request_ride(test_request(rider)).expect("plain");
        let b = cached.request_ride(test_request(rider)).expect("cached");
        assert_eq!(a.vehicle_id, b.vehicle_id);
        assert_eq!(a.distance_km, b.distance_km);
        assert_eq!(a.fare, b.fare);
    }
}

#[test]
fn nearest_and_weighted_agree_on_a_single_candidate() {
    let only = VehicleBuilder::new("ONLY").at(28.62, 77.22).battery(30.0).build();
    let a = NearestMatching
        .find_match(CONNAUGHT_PLACE, &[&only], Some(&VehicleType::Suv), &Haversine)
        .expect("nearest");
    let b = BatteryWeightedMatching::default()
        .find_match(CONNAUGHT_PLACE, &[&only], Some(&VehicleType::Suv), &Haversine)
        .expect("weighted");
    assert_eq!(a.vehicle_id, b.vehicle_id);
    assert_eq!(a.pickup_distance_km, b.pickup_distance_km);
}
