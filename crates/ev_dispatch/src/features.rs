//! Feature names, per-request signal collection and ordered feature vectors.
//!
//! A model artifact declares the feature names it was trained on, in order. The
//! assembler turns whatever signals a request produced into exactly that list:
//! one value per declared name, 0 for anything the request did not supply. A
//! vector is never shorter or longer than the declaration.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::context::RideContext;
use crate::encoding::{Category, LabelEncoders, DEFAULT_CODE};
use crate::fleet::Vehicle;
use crate::rides::RideRequest;

/// Feature names the fare model knows about. Names an artifact declares that are
/// not in this list are kept as [`FeatureName::Other`] and always read as 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(from = "String", into = "String")]
pub enum FeatureName {
    DistanceKm,
    DurationMinutes,
    DemandFactor,
    BatteryHealthPercent,
    EnergyConsumptionKwh,
    RouteDifficulty,
    DayOfWeek,
    TemperatureCelsius,
    HumidityPercent,
    DriverRating,
    SurgeMultiplier,
    HistoricalPricingFactor,
    IsHoliday,
    ChargingStationsNearby,
    CityEncoded,
    TrafficLevelEncoded,
    VehicleTypeEncoded,
    TimeOfDayEncoded,
    WeatherConditionEncoded,
    UserTypeEncoded,
    #[strum(default)]
    Other(String),
}

impl FeatureName {
    pub fn as_str(&self) -> &str {
        match self {
            FeatureName::Other(name) => name.as_str(),
            known => {
                let label: &'static str = known.into();
                label
            }
        }
    }

    /// The twenty features every request produces, in training order.
    pub fn standard() -> Vec<FeatureName> {
        use FeatureName::*;
        vec![
            DistanceKm,
            DurationMinutes,
            DemandFactor,
            BatteryHealthPercent,
            EnergyConsumptionKwh,
            RouteDifficulty,
            DayOfWeek,
            TemperatureCelsius,
            HumidityPercent,
            DriverRating,
            SurgeMultiplier,
            HistoricalPricingFactor,
            IsHoliday,
            ChargingStationsNearby,
            CityEncoded,
            TrafficLevelEncoded,
            VehicleTypeEncoded,
            TimeOfDayEncoded,
            WeatherConditionEncoded,
            UserTypeEncoded,
        ]
    }
}

impl From<String> for FeatureName {
    fn from(name: String) -> Self {
        // The `Other` default makes parsing total.
        name.parse().unwrap_or(FeatureName::Other(name))
    }
}

impl From<FeatureName> for String {
    fn from(name: FeatureName) -> Self {
        name.as_str().to_string()
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live signal values gathered for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSignals {
    values: HashMap<FeatureName, f64>,
}

impl FeatureSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: FeatureName, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: FeatureName, value: f64) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &FeatureName) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Values in the exact order a predictor declared.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<FeatureName>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// One value per declared name; missing signals read as 0.
    pub fn assemble(declared: &[FeatureName], signals: &FeatureSignals) -> Self {
        let values = declared
            .iter()
            .map(|name| signals.get(name).unwrap_or(0.0))
            .collect();
        Self {
            names: declared.to_vec(),
            values,
        }
    }

    pub fn names(&self) -> &[FeatureName] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FeatureName, f64)> {
        self.names.iter().zip(self.values.iter().copied())
    }
}

/// Stand-ins for inputs that are not wired to live data yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFeatureDefaults {
    pub energy_kwh_per_km: f64,
    pub route_difficulty: f64,
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub historical_pricing_factor: f64,
    pub charging_stations_nearby: f64,
    pub weather_condition: String,
}

impl Default for StaticFeatureDefaults {
    fn default() -> Self {
        Self {
            energy_kwh_per_km: 0.25,
            route_difficulty: 3.0,
            temperature_celsius: 28.0,
            humidity_percent: 65.0,
            historical_pricing_factor: 1.0,
            charging_stations_nearby: 3.0,
            weather_condition: "clear".to_string(),
        }
    }
}

/// Everything known about a matched trip before pricing.
#[derive(Debug, Clone, Copy)]
pub struct TripSignals<'a> {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub context: &'a RideContext,
    pub vehicle: &'a Vehicle,
    pub request: &'a RideRequest,
}

/// Signals plus the categories whose value the encoders had never seen.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedSignals {
    pub signals: FeatureSignals,
    pub unseen: Vec<Category>,
}

/// Gather the standard signal set for a trip.
///
/// When the request carries no vehicle preference the matched vehicle's type is
/// encoded instead.
pub fn collect_signals(
    trip: &TripSignals<'_>,
    defaults: &StaticFeatureDefaults,
    encoders: &LabelEncoders,
) -> CollectedSignals {
    let ctx = trip.context;
    let time_of_day = trip.request.time_of_day.unwrap_or(ctx.time_of_day);
    let vehicle_type = trip
        .request
        .vehicle_type
        .as_ref()
        .unwrap_or(&trip.vehicle.vehicle_type);

    let mut unseen = Vec::new();
    let mut encode = |value: &str, category: Category| -> f64 {
        let code = encoders.lookup(value, category).unwrap_or_else(|| {
            unseen.push(category);
            DEFAULT_CODE
        });
        code as f64
    };

    let city = encode(&trip.request.city, Category::City);
    let traffic = encode(ctx.congestion.as_str(), Category::TrafficLevel);
    let vehicle = encode(vehicle_type.as_str(), Category::VehicleType);
    let tod = encode(time_of_day.as_str(), Category::TimeOfDay);
    let weather = encode(&defaults.weather_condition, Category::WeatherCondition);
    let user = encode(&trip.request.user_type, Category::UserType);

    let signals = FeatureSignals::new()
        .with(FeatureName::DistanceKm, trip.distance_km)
        .with(FeatureName::DurationMinutes, trip.duration_minutes)
        .with(FeatureName::DemandFactor, ctx.demand_factor)
        .with(FeatureName::BatteryHealthPercent, trip.vehicle.battery_percent)
        .with(
            FeatureName::EnergyConsumptionKwh,
            trip.distance_km * defaults.energy_kwh_per_km,
        )
        .with(FeatureName::RouteDifficulty, defaults.route_difficulty)
        .with(FeatureName::DayOfWeek, f64::from(ctx.weekday))
        .with(FeatureName::TemperatureCelsius, defaults.temperature_celsius)
        .with(FeatureName::HumidityPercent, defaults.humidity_percent)
        .with(FeatureName::DriverRating, trip.vehicle.rating)
        .with(FeatureName::SurgeMultiplier, ctx.surge_multiplier)
        .with(
            FeatureName::HistoricalPricingFactor,
            defaults.historical_pricing_factor,
        )
        .with(FeatureName::IsHoliday, if ctx.is_holiday { 1.0 } else { 0.0 })
        .with(
            FeatureName::ChargingStationsNearby,
            defaults.charging_stations_nearby,
        )
        .with(FeatureName::CityEncoded, city)
        .with(FeatureName::TrafficLevelEncoded, traffic)
        .with(FeatureName::VehicleTypeEncoded, vehicle)
        .with(FeatureName::TimeOfDayEncoded, tod)
        .with(FeatureName::WeatherConditionEncoded, weather)
        .with(FeatureName::UserTypeEncoded, user);

    CollectedSignals { signals, unseen }
}
