pub mod geo;
pub mod clock;
pub mod context;
pub mod speed;
pub mod encoding;
pub mod features;
pub mod model;
pub mod pricing;
pub mod fleet;
pub mod matching;
pub mod rides;
pub mod error;
pub mod config;
pub mod telemetry;
pub mod service;
pub mod location_feed;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
