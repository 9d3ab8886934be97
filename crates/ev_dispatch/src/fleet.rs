//! Vehicles and the sources a fleet can be built from: the fixed seed list, a
//! JSON fleet file, or a seeded synthetic generator for load tests.

use std::fmt;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::geo::Coordinate;

/// Default bounding box: central Delhi (approx).
const DEFAULT_LAT_MIN: f64 = 28.50;
const DEFAULT_LAT_MAX: f64 = 28.75;
const DEFAULT_LNG_MIN: f64 = 77.05;
const DEFAULT_LNG_MAX: f64 = 77.35;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VehicleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body style. Labels outside the known set are kept verbatim so they still
/// reach the label encoder unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VehicleType {
    Sedan,
    Suv,
    Hatchback,
    Other(String),
}

impl VehicleType {
    pub fn as_str(&self) -> &str {
        match self {
            VehicleType::Sedan => "sedan",
            VehicleType::Suv => "suv",
            VehicleType::Hatchback => "hatchback",
            VehicleType::Other(label) => label,
        }
    }
}

impl From<String> for VehicleType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "sedan" => VehicleType::Sedan,
            "suv" => VehicleType::Suv,
            "hatchback" => VehicleType::Hatchback,
            _ => VehicleType::Other(label),
        }
    }
}

impl From<&str> for VehicleType {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<VehicleType> for String {
    fn from(vehicle_type: VehicleType) -> Self {
        vehicle_type.as_str().to_string()
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One electric vehicle and its driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub location: Coordinate,
    pub available: bool,
    /// Battery health, 0–100.
    pub battery_percent: f64,
    pub vehicle_type: VehicleType,
    /// Driver rating, 1.0–5.0.
    pub rating: f64,
}

impl Vehicle {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: Coordinate,
        battery_percent: f64,
        vehicle_type: VehicleType,
        rating: f64,
    ) -> Self {
        Self {
            id: VehicleId::new(id),
            name: name.into(),
            location,
            available: true,
            battery_percent,
            vehicle_type,
            rating,
        }
    }

    /// Available and charged above `min_battery_percent` (strictly).
    pub fn is_dispatchable(&self, min_battery_percent: f64) -> bool {
        self.available && self.battery_percent > min_battery_percent
    }
}

/// The five-vehicle Delhi fleet the service starts with when no fleet file is
/// configured.
pub fn seed_fleet() -> Vec<Vehicle> {
    vec![
        Vehicle::new(
            "D001",
            "Rajesh Kumar",
            Coordinate::new(28.6139, 77.2090),
            85.0,
            VehicleType::Sedan,
            4.5,
        ),
        Vehicle::new(
            "D002",
            "Amit Singh",
            Coordinate::new(28.6300, 77.2200),
            92.0,
            VehicleType::Suv,
            4.7,
        ),
        Vehicle::new(
            "D003",
            "Priya Sharma",
            Coordinate::new(28.6000, 77.2000),
            78.0,
            VehicleType::Hatchback,
            4.3,
        ),
        Vehicle::new(
            "D004",
            "Rahul Verma",
            Coordinate::new(28.6500, 77.2300),
            88.0,
            VehicleType::Sedan,
            4.6,
        ),
        Vehicle::new(
            "D005",
            "Sneha Patel",
            Coordinate::new(28.5900, 77.1900),
            95.0,
            VehicleType::Suv,
            4.8,
        ),
    ]
}

/// Load a fleet from a JSON array of [`Vehicle`] records.
pub fn load_fleet<P: AsRef<Path>>(path: P) -> Result<Vec<Vehicle>, ArtifactError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let fleet: Vec<Vehicle> = serde_json::from_str(&content)?;
    let mut ids: Vec<&VehicleId> = fleet.iter().map(|v| &v.id).collect();
    ids.sort();
    if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(ArtifactError::Invalid(format!(
            "duplicate vehicle id {}",
            pair[0]
        )));
    }
    Ok(fleet)
}

/// Area synthetic vehicles are spread over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FleetBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl Default for FleetBounds {
    fn default() -> Self {
        Self {
            lat_min: DEFAULT_LAT_MIN,
            lat_max: DEFAULT_LAT_MAX,
            lng_min: DEFAULT_LNG_MIN,
            lng_max: DEFAULT_LNG_MAX,
        }
    }
}

impl FleetBounds {
    pub fn contains(&self, point: Coordinate) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.latitude)
            && (self.lng_min..=self.lng_max).contains(&point.longitude)
    }

    /// Uniform random point inside the box.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Coordinate {
        Coordinate::new(
            rng.gen_range(self.lat_min..=self.lat_max),
            rng.gen_range(self.lng_min..=self.lng_max),
        )
    }
}

/// Reproducible random fleet. Ids are `V0001`, `V0002`, ...; batteries span
/// 10–100% so some vehicles fall under the dispatch threshold.
pub fn synthetic_fleet(count: usize, seed: u64, bounds: FleetBounds) -> Vec<Vehicle> {
    const TYPES: [VehicleType; 3] = [VehicleType::Sedan, VehicleType::Suv, VehicleType::Hatchback];

    let mut rng = StdRng::seed_from_u64(seed);
    (1..=count)
        .map(|i| {
            let location = bounds.sample(&mut rng);
            let battery = rng.gen_range(10.0..=100.0_f64).round();
            let vehicle_type = TYPES[rng.gen_range(0..TYPES.len())].clone();
            let rating = (rng.gen_range(3.5..=5.0_f64) * 10.0).round() / 10.0;
            Vehicle::new(
                format!("V{i:04}"),
                format!("Driver {i}"),
                location,
                battery,
                vehicle_type,
                rating,
            )
        })
        .collect()
}
