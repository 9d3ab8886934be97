//! Ride session orchestrator.
//!
//! Owns the vehicle and ride registries behind one mutex. A booking
//! (filter candidates, match, price, flip availability, store the ride) runs as
//! a single critical section, so two concurrent requests can never take the same
//! vehicle. Pricing is a bounded in-memory computation and runs inside that
//! section.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{MatcherKind, ServiceConfig};
use crate::context::RideContext;
use crate::encoding::LabelEncoders;
use crate::error::{ArtifactError, DispatchError};
use crate::features::{collect_signals, TripSignals};
use crate::fleet::{load_fleet, seed_fleet, Vehicle, VehicleId};
use crate::geo::{route_preview, round2, CachedDistance, Coordinate, DistanceMetric, Haversine};
use crate::matching::{BatteryWeightedMatching, NearestMatching, VehicleMatcher};
use crate::model::ModelArtifact;
use crate::pricing::{FarePrediction, FarePredictor};
use crate::rides::{FareSource, RideId, RideRecord, RideRequest, RideStats, RideStatus};
use crate::telemetry::{DispatchTelemetry, TelemetrySnapshot};

#[derive(Debug, Default)]
pub(crate) struct DispatchState {
    /// Ordered by id so matcher ties resolve deterministically.
    vehicles: BTreeMap<VehicleId, Vehicle>,
    rides: HashMap<RideId, RideRecord>,
    /// Last issued ride sequence number.
    ride_sequence: u64,
}

/// What the service is pricing with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub model_fitted: bool,
    pub encoders_loaded: bool,
    pub feature_count: usize,
    pub trained_at: Option<DateTime<Utc>>,
    pub total_rides: usize,
    pub total_vehicles: usize,
}

pub struct RideService {
    state: Mutex<DispatchState>,
    predictor: FarePredictor,
    encoders: LabelEncoders,
    matcher: Box<dyn VehicleMatcher>,
    distance: Box<dyn DistanceMetric>,
    clock: Arc<dyn Clock>,
    telemetry: DispatchTelemetry,
    config: ServiceConfig,
}

fn matcher_for(kind: MatcherKind) -> Box<dyn VehicleMatcher> {
    match kind {
        MatcherKind::BatteryWeighted => Box::new(BatteryWeightedMatching::default()),
        MatcherKind::Nearest => Box::new(NearestMatching),
    }
}

fn distance_for(cache_size: usize) -> Box<dyn DistanceMetric> {
    if cache_size == 0 {
        Box::new(Haversine)
    } else {
        Box::new(CachedDistance::with_capacity(Haversine, cache_size))
    }
}

impl RideService {
    /// Service over `fleet` with no fare model. A later vehicle with a repeated
    /// id replaces the earlier one.
    pub fn new(fleet: Vec<Vehicle>, config: ServiceConfig) -> Self {
        let vehicles = fleet.into_iter().map(|v| (v.id.clone(), v)).collect();
        Self {
            state: Mutex::new(DispatchState {
                vehicles,
                ..DispatchState::default()
            }),
            predictor: FarePredictor::new(config.pricing),
            encoders: LabelEncoders::default(),
            matcher: matcher_for(config.matcher),
            distance: distance_for(config.distance_cache_size),
            clock: Arc::new(SystemClock),
            telemetry: DispatchTelemetry::default(),
            config,
        }
    }

    /// Build from configuration, loading the fleet, model and encoder files it
    /// names. Only an unreadable fleet file is an error; a missing or broken
    /// model or encoder file leaves the service on the fallback formula.
    pub fn from_config(config: ServiceConfig) -> Result<Self, ArtifactError> {
        let fleet = match &config.fleet_path {
            Some(path) => {
                let fleet = load_fleet(path)?;
                info!(path = %path.display(), vehicles = fleet.len(), "loaded fleet");
                fleet
            }
            None => seed_fleet(),
        };

        Ok(Self::from_config_with_fleet(fleet, config))
    }

    /// Service over `fleet` with the model and encoder files `config` names.
    /// `config.fleet_path` is ignored. Artifact failures are logged and leave
    /// the service on the fallback formula.
    pub fn from_config_with_fleet(fleet: Vec<Vehicle>, config: ServiceConfig) -> Self {
        let model = config.model_path.as_ref().and_then(|path| {
            match ModelArtifact::load(path) {
                Ok(artifact) => {
                    info!(
                        path = %path.display(),
                        features = artifact.feature_columns().len(),
                        fitted = artifact.is_fitted(),
                        "loaded fare model"
                    );
                    Some(artifact)
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "fare model unavailable, using fallback formula");
                    None
                }
            }
        });

        let encoders = config.label_encoders_path.as_ref().and_then(|path| {
            match LabelEncoders::load(path) {
                Ok(encoders) => {
                    info!(path = %path.display(), "loaded label encoders");
                    Some(encoders)
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "label encoders unavailable, encoding with defaults");
                    None
                }
            }
        });

        let mut service = Self::new(fleet, config);
        if let Some(artifact) = model {
            service = service.with_model(Arc::new(artifact));
        }
        if let Some(encoders) = encoders {
            service = service.with_label_encoders(encoders);
        }
        service
    }

    pub fn with_model(mut self, artifact: Arc<ModelArtifact>) -> Self {
        self.predictor = self.predictor.with_artifact(artifact);
        self
    }

    pub fn with_label_encoders(mut self, encoders: LabelEncoders) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_matcher(mut self, matcher: Box<dyn VehicleMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_distance_metric(mut self, distance: Box<dyn DistanceMetric>) -> Self {
        self.distance = distance;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DispatchState> {
        // Every mutation leaves the registries consistent before it can panic,
        // so a poisoned lock still guards valid state.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Match, price and book a ride. The chosen vehicle becomes unavailable.
    pub fn request_ride(&self, request: RideRequest) -> Result<RideRecord, DispatchError> {
        self.telemetry.record_request();
        let now = self.clock.now();
        let context = RideContext::at(now, &self.config.holidays);

        let mut state = self.lock();
        match self.book(&mut state, &request, now, &context) {
            Ok((ride, prediction, unseen)) => {
                self.telemetry.record_booking(&prediction, unseen);
                info!(
                    ride = %ride.id,
                    rider = %ride.rider_id,
                    vehicle = %ride.vehicle_id,
                    fare = ride.fare,
                    surge = ride.surge_multiplier,
                    "ride booked"
                );
                Ok(ride)
            }
            Err(err) => {
                self.telemetry.record_rejection(&err);
                info!(rider = %request.rider_id, error = %err, "ride request rejected");
                Err(err)
            }
        }
    }

    fn book(
        &self,
        state: &mut DispatchState,
        request: &RideRequest,
        now: NaiveDateTime,
        context: &RideContext,
    ) -> Result<(RideRecord, FarePrediction, usize), DispatchError> {
        let min_battery = self.config.min_battery_percent;
        let outcome = {
            let candidates: Vec<&Vehicle> = state
                .vehicles
                .values()
                .filter(|v| v.is_dispatchable(min_battery))
                .collect();
            if candidates.is_empty() {
                return Err(DispatchError::NoVehiclesAvailable);
            }
            self.matcher
                .find_match(
                    request.pickup,
                    &candidates,
                    request.vehicle_type.as_ref(),
                    self.distance.as_ref(),
                )
                .ok_or(DispatchError::NoMatch)?
        };
        let vehicle = state
            .vehicles
            .get(&outcome.vehicle_id)
            .cloned()
            .ok_or(DispatchError::NoMatch)?;

        let distance_km = self.distance.distance_km(request.pickup, request.dropoff);
        let duration_minutes = self
            .config
            .speeds
            .estimated_duration_minutes(distance_km, context.congestion);

        let collected = collect_signals(
            &TripSignals {
                distance_km,
                duration_minutes,
                context,
                vehicle: &vehicle,
                request,
            },
            &self.config.feature_defaults,
            &self.encoders,
        );
        if !collected.unseen.is_empty() {
            debug!(categories = ?collected.unseen, "unseen category values encoded as 0");
        }
        let prediction = self.predictor.predict(&collected.signals);
        let fare = prediction.fare();
        let fare_source = if prediction.is_fallback() {
            FareSource::Fallback
        } else {
            FareSource::Model
        };

        state.ride_sequence += 1;
        let ride = RideRecord {
            id: RideId::generate(state.ride_sequence, now),
            rider_id: request.rider_id.clone(),
            vehicle_id: vehicle.id.clone(),
            pickup: request.pickup,
            dropoff: request.dropoff,
            route: route_preview(request.pickup, request.dropoff),
            fare,
            base_fare: fare / context.surge_multiplier,
            surge_multiplier: context.surge_multiplier,
            fare_source,
            distance_km,
            pickup_distance_km: outcome.pickup_distance_km,
            duration_minutes,
            demand_factor: context.demand_factor,
            congestion: context.congestion,
            time_of_day: context.time_of_day,
            status: RideStatus::Pending,
            created_at: now,
            accepted_at: None,
            completed_at: None,
        };

        if let Some(v) = state.vehicles.get_mut(&vehicle.id) {
            v.available = false;
        }
        state.rides.insert(ride.id.clone(), ride.clone());
        Ok((ride, prediction, collected.unseen.len()))
    }

    /// Driver acceptance. Only the assigned vehicle may accept.
    pub fn accept_ride(
        &self,
        ride_id: &RideId,
        driver_id: &VehicleId,
    ) -> Result<RideRecord, DispatchError> {
        let now = self.clock.now();
        let mut state = self.lock();
        let ride = state
            .rides
            .get_mut(ride_id)
            .ok_or_else(|| DispatchError::RideNotFound(ride_id.clone()))?;

        if &ride.vehicle_id != driver_id {
            return Err(DispatchError::NotAssigned {
                ride: ride_id.clone(),
                driver: driver_id.clone(),
            });
        }
        transition(ride, RideStatus::Accepted)?;
        ride.accepted_at = Some(now);
        let ride = ride.clone();
        drop(state);

        self.telemetry.record_accept();
        info!(ride = %ride.id, vehicle = %ride.vehicle_id, "ride accepted");
        Ok(ride)
    }

    /// Finish a ride and release its vehicle.
    pub fn complete_ride(&self, ride_id: &RideId) -> Result<RideRecord, DispatchError> {
        let now = self.clock.now();
        let mut state = self.lock();
        let ride = state
            .rides
            .get_mut(ride_id)
            .ok_or_else(|| DispatchError::RideNotFound(ride_id.clone()))?;

        transition(ride, RideStatus::Completed)?;
        ride.completed_at = Some(now);
        let ride = ride.clone();
        if let Some(vehicle) = state.vehicles.get_mut(&ride.vehicle_id) {
            vehicle.available = true;
        }
        drop(state);

        self.telemetry.record_complete();
        info!(ride = %ride.id, vehicle = %ride.vehicle_id, fare = ride.fare, "ride completed");
        Ok(ride)
    }

    pub fn get_ride(&self, ride_id: &RideId) -> Result<RideRecord, DispatchError> {
        self.lock()
            .rides
            .get(ride_id)
            .cloned()
            .ok_or_else(|| DispatchError::RideNotFound(ride_id.clone()))
    }

    pub fn get_vehicle(&self, vehicle_id: &VehicleId) -> Result<Vehicle, DispatchError> {
        self.lock()
            .vehicles
            .get(vehicle_id)
            .cloned()
            .ok_or_else(|| DispatchError::VehicleNotFound(vehicle_id.clone()))
    }

    /// Vehicles with the available flag set, in id order. Charge is not
    /// considered here.
    pub fn list_available_vehicles(&self) -> Vec<Vehicle> {
        self.lock()
            .vehicles
            .values()
            .filter(|v| v.available)
            .cloned()
            .collect()
    }

    pub fn update_vehicle_location(
        &self,
        vehicle_id: &VehicleId,
        location: Coordinate,
    ) -> Result<Vehicle, DispatchError> {
        let updated = {
            let mut state = self.lock();
            let vehicle = state
                .vehicles
                .get_mut(vehicle_id)
                .ok_or_else(|| DispatchError::VehicleNotFound(vehicle_id.clone()))?;
            vehicle.location = location;
            vehicle.clone()
        };
        self.telemetry.record_location_update();
        Ok(updated)
    }

    pub fn get_stats(&self) -> RideStats {
        let state = self.lock();
        let mut stats = RideStats::default();
        let mut fare_sum = 0.0;
        let mut distance_sum = 0.0;
        for ride in state.rides.values() {
            stats.add_ride(ride.status);
            if ride.status == RideStatus::Completed {
                fare_sum += ride.fare;
                distance_sum += ride.distance_km;
            }
        }
        if stats.completed > 0 {
            stats.avg_fare = round2(fare_sum / stats.completed as f64);
            stats.avg_distance_km = round2(distance_sum / stats.completed as f64);
        }
        stats.available_vehicles = state.vehicles.values().filter(|v| v.available).count();
        stats
    }

    pub fn model_status(&self) -> ModelStatus {
        let state = self.lock();
        let artifact = self.predictor.artifact();
        ModelStatus {
            model_loaded: artifact.is_some(),
            model_fitted: artifact.is_some_and(ModelArtifact::is_fitted),
            encoders_loaded: !self.encoders.is_empty(),
            feature_count: artifact.map_or(0, |a| a.feature_columns().len()),
            trained_at: artifact.and_then(ModelArtifact::trained_at),
            total_rides: state.rides.len(),
            total_vehicles: state.vehicles.len(),
        }
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }
}

fn transition(ride: &mut RideRecord, to: RideStatus) -> Result<(), DispatchError> {
    if !ride.status.can_transition_to(to) {
        return Err(DispatchError::InvalidTransition {
            ride: ride.id.clone(),
            from: ride.status,
            to,
        });
    }
    ride.status = to;
    Ok(())
}
