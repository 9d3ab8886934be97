use ev_dispatch::fleet::{Vehicle, VehicleType};
use ev_dispatch::geo::Coordinate;
use ev_dispatch::test_helpers::CONNAUGHT_PLACE;

/// Builder for simple vehicle fixtures.
#[derive(Clone, Debug)]
pub struct VehicleBuilder {
    id: String,
    location: Coordinate,
    battery_percent: f64,
    vehicle_type: VehicleType,
    rating: f64,
    available: bool,
}

impl VehicleBuilder {
    /// Fully charged sedan at Connaught Place.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            location: CONNAUGHT_PLACE,
            battery_percent: 100.0,
            vehicle_type: VehicleType::Sedan,
            rating: 4.5,
            available: true,
        }
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Coordinate::new(latitude, longitude);
        self
    }

    pub fn location(mut self, location: Coordinate) -> Self {
        self.location = location;
        self
    }

    pub fn battery(mut self, percent: f64) -> Self {
        self.battery_percent = percent;
        self
    }

    pub fn kind(mut self, vehicle_type: VehicleType) -> Self {
        self.vehicle_type = vehicle_type;
        self
    }

    pub fn rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn build(self) -> Vehicle {
        let mut vehicle = Vehicle::new(
            self.id.clone(),
            format!("Driver {}", self.id),
            self.location,
            self.battery_percent,
            self.vehicle_type,
            self.rating,
        );
        vehicle.available = self.available;
        vehicle
    }
}
