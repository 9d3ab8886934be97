//! Geographic primitives: coordinates, great-circle distance and the cosmetic
//! route preview returned with every ride.
//!
//! Distance is consumed through the [`DistanceMetric`] trait so the orchestrator
//! can be handed any great-circle implementation. [`Haversine`] is the default;
//! [`CachedDistance`] wraps any metric with an LRU cache for hot pickup/vehicle
//! pairs.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default number of coordinate pairs kept by [`CachedDistance`].
pub const DEFAULT_DISTANCE_CACHE_SIZE: usize = 50_000;

/// A (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Point halfway between `self` and `other` in plain degree space.
    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Coordinate::new(
            (self.latitude + other.latitude) / 2.0,
            (self.longitude + other.longitude) / 2.0,
        )
    }

    fn cache_key(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

/// Great-circle distance source used by matching and trip measurement.
pub trait DistanceMetric: Send + Sync {
    /// Distance in kilometres between two coordinates.
    fn distance_km(&self, a: Coordinate, b: Coordinate) -> f64;
}

/// Haversine distance on a sphere of radius [`EARTH_RADIUS_KM`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceMetric for Haversine {
    fn distance_km(&self, a: Coordinate, b: Coordinate) -> f64 {
        haversine_km(a, b)
    }
}

/// Haversine great-circle distance in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// LRU-cached wrapper around another [`DistanceMetric`].
///
/// Keys are symmetric (the smaller coordinate first) so `a -> b` and `b -> a`
/// share one entry.
pub struct CachedDistance<M> {
    inner: M,
    cache: Mutex<LruCache<((u64, u64), (u64, u64)), f64>>,
}

impl<M: DistanceMetric> CachedDistance<M> {
    pub fn new(inner: M) -> Self {
        Self::with_capacity(inner, DEFAULT_DISTANCE_CACHE_SIZE)
    }

    /// A capacity of zero is bumped to one entry.
    pub fn with_capacity(inner: M, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached pairs.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: DistanceMetric> DistanceMetric for CachedDistance<M> {
    fn distance_km(&self, a: Coordinate, b: Coordinate) -> f64 {
        let (ka, kb) = (a.cache_key(), b.cache_key());
        let key = if ka < kb { (ka, kb) } else { (kb, ka) };

        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            // Poisoned: compute without the cache.
            Err(_) => return self.inner.distance_km(a, b),
        };
        *cache.get_or_insert(key, || self.inner.distance_km(a, b))
    }
}

/// Cosmetic three-point route: pickup, straight-line midpoint, dropoff.
/// This is not routing; it only gives clients something to draw.
pub fn route_preview(pickup: Coordinate, dropoff: Coordinate) -> Vec<Coordinate> {
    vec![pickup, pickup.midpoint(&dropoff), dropoff]
}

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
