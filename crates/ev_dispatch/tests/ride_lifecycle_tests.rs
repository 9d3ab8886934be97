mod support;

use ev_dispatch::error::{DispatchError, ErrorKind};
use ev_dispatch::fleet::{Vehicle, VehicleId, VehicleType};
use ev_dispatch::geo::{Coordinate, DistanceMetric};
use ev_dispatch::matching::{MatchOutcome, VehicleMatcher};
use ev_dispatch::rides::{RideId, RideStatus};
use ev_dispatch::test_helpers::{test_request, CIVIL_LINES, CONNAUGHT_PLACE};
use support::fleet::VehicleBuilder;
use support::service::ServiceBuilder;

struct NeverMatches;

impl VehicleMatcher for NeverMatches {
    fn find_match(
        &self,
        _pickup: Coordinate,
        _candidates: &[&Vehicle],
        _vehicle_type: Option<&VehicleType>,
        _distance: &dyn DistanceMetric,
    ) -> Option<MatchOutcome> {
        None
    }
}

#[test]
fn request_accept_complete_round_trip() {
    let service = ServiceBuilder::new().build();

    let ride = service.request_ride(test_request("U100")).expect("booked");
    assert_eq!(ride.status, RideStatus::Pending);
    assert_eq!(ride.rider_id, "U100");
    assert_eq!(ride.route, vec![CONNAUGHT_PLACE, CONNAUGHT_PLACE.midpoint(&CIVIL_LINES), CIVIL_LINES]);
    assert!(ride.accepted_at.is_none());

    let accepted = service
        .accept_ride(&ride.id, &ride.vehicle_id)
        .expect("accepted");
    assert_eq!(accepted.status, RideStatus::Accepted);

    let completed = service.complete_ride(&ride.id).expect("completed");
    assert_eq!(completed.status, RideStatus::Completed);
    assert!(completed.completed_at.is_some());
    assert_eq!(service.get_ride(&ride.id).expect("ride"), completed);
}

#[test]
fn pending_ride_can_complete_without_acceptance() {
    let service = ServiceBuilder::new().build();
    let ride = service.request_ride(test_request("U1")).expect("booked");

    let completed = service.complete_ride(&ride.id).expect("completed");
    assert_eq!(completed.status, RideStatus::Completed);
    assert!(completed.accepted_at.is_none());
}

#[test]
fn completed_ride_cannot_move_again() {
    let service = ServiceBuilder::new().build();
    let ride = service.request_ride(test_request("U1")).expect("booked");
    service.complete_ride(&ride.id).expect("completed");

    let err = service.complete_ride(&ride.id).expect_err("second completion");
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    assert_eq!(
        err,
        DispatchError::InvalidTransition {
            ride: ride.id.clone(),
            from: RideStatus::Completed,
            to: RideStatus::Completed,
        }
    );

    // The vehicle was released once and stays released.
    assert!(service.get_vehicle(&ride.vehicle_id).expect("vehicle").available);
    assert_eq!(service.get_stats().completed, 1);
}

#[test]
fn forbidden_accept_leaves_ride_untouched() {
    let service = ServiceBuilder::new().build();
    let ride = service.request_ride(test_request("U1")).expect("booked");

    let intruder = VehicleId::from("D003");
    let err = service.accept_ride(&ride.id, &intruder).expect_err("forbidden");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(
        err.to_string(),
        format!("Driver D003 is not assigned to ride {}", ride.id)
    );
    assert_eq!(service.get_ride(&ride.id).expect("ride"), ride);
}

#[test]
fn unknown_ride_is_not_found_everywhere() {
    let service = ServiceBuilder::new().build();
    let missing = RideId::from("RIDE_404_20240508090000");
    let driver = VehicleId::from("D001");

    for err in [
        service.get_ride(&missing).expect_err("get"),
        service.accept_ride(&missing, &driver).expect_err("accept"),
        service.complete_ride(&missing).expect_err("complete"),
    ] {
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

#[test]
fn vehicle_is_booked_once_until_completion() {
    let service = ServiceBuilder::new()
        .fleet(vec![VehicleBuilder::new("SOLO").battery(90.0).build()])
        .build();

    let first = service.request_ride(test_request("U1")).expect("first");
    assert_eq!(
        service.request_ride(test_request("U2")),
        Err(DispatchError::NoVehiclesAvailable)
    );

    service.complete_ride(&first.id).expect("completed");
    let second = service.request_ride(test_request("U2")).expect("second");
    assert_eq!(second.vehicle_id, first.vehicle_id);
    assert_ne!(second.id, first.id);
}

#[test]
fn drained_and_offline_vehicles_are_not_candidates() {
    let service = ServiceBuilder::new()
        .fleet(vec![
            VehicleBuilder::new("LOW").battery(20.0).build(),
            VehicleBuilder::new("OFF").unavailable().build(),
        ])
        .build();

    let err = service.request_ride(test_request("U1")).expect_err("no drivers");
    assert_eq!(err.to_string(), "No available drivers found");

    // Availability listing ignores charge.
    let listed: Vec<String> = service
        .list_available_vehicles()
        .into_iter()
        .map(|v| v.id.to_string())
        .collect();
    assert_eq!(listed, vec!["LOW".to_string()]);
}

#[test]
fn matcher_returning_nothing_is_no_match() {
    let service = ServiceBuilder::new().build().with_matcher(Box::new(NeverMatches));

    assert_eq!(
        service.request_ride(test_request("U1")),
        Err(DispatchError::NoMatch)
    );
    assert_eq!(service.list_available_vehicles().len(), 5);
    assert_eq!(service.telemetry().rejected_no_match, 1);
}

#[test]
fn relocated_vehicle_wins_next_match() {
    let service = ServiceBuilder::new().build();
    let d005 = VehicleId::from("D005");

    service
        .update_vehicle_location(&d005, CONNAUGHT_PLACE)
        .expect("moved");
    let ride = service
        .request_ride(test_request("U1").with_vehicle_type(VehicleType::Suv))
        .expect("booked");

    assert_eq!(ride.vehicle_id, d005);
    assert_eq!(ride.pickup_distance_km, 0.0);
}

#[test]
fn stats_track_each_status() {
    let service = ServiceBuilder::new().build();
    let stats = service.get_stats();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.avg_fare, 0.0);
    assert_eq!(stats.avg_distance_km, 0.0);
    assert_eq!(stats.available_vehicles, 5);

    let a = service.request_ride(test_request("A")).expect("a");
    let b = service.request_ride(test_request("B")).expect("b");
    let _c = service.request_ride(test_request("C")).expect("c");
    service.accept_ride(&a.id, &a.vehicle_id).expect("accept a");
    service.complete_ride(&b.id).expect("complete b");

    let stats = service.get_stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.available_vehicles, 3);
    assert_eq!(stats.avg_fare, (b.fare * 100.0).round() / 100.0);
}
