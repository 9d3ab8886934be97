//! Service configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config and a
//! missing config file means "run with the built-in seed fleet and no model".

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::HolidayCalendar;
use crate::error::ConfigError;
use crate::features::StaticFeatureDefaults;
use crate::pricing::PricingConfig;
use crate::speed::CongestionSpeeds;

/// Vehicles at or below this charge are never dispatched.
pub const DEFAULT_MIN_BATTERY_PERCENT: f64 = 20.0;

/// Which matcher the service uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    #[default]
    BatteryWeighted,
    Nearest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub pricing: PricingConfig,
    /// Minimum battery percent (exclusive) for a vehicle to be a candidate.
    pub min_battery_percent: f64,
    pub matcher: MatcherKind,
    pub speeds: CongestionSpeeds,
    pub feature_defaults: StaticFeatureDefaults,
    pub holidays: HolidayCalendar,
    /// Capacity of the pairwise distance cache; 0 disables caching.
    pub distance_cache_size: usize,
    /// Fare model artifact (JSON). Optional.
    pub model_path: Option<PathBuf>,
    /// Label encoder tables (JSON). Optional.
    pub label_encoders_path: Option<PathBuf>,
    /// Fleet file (JSON). The seed fleet is used when absent.
    pub fleet_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            min_battery_percent: DEFAULT_MIN_BATTERY_PERCENT,
            matcher: MatcherKind::default(),
            speeds: CongestionSpeeds::default(),
            feature_defaults: StaticFeatureDefaults::default(),
            holidays: HolidayCalendar::default(),
            distance_cache_size: 0,
            model_path: None,
            label_encoders_path: None,
            fleet_path: None,
        }
    }
}

impl ServiceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn with_pricing_config(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_min_battery_percent(mut self, percent: f64) -> Self {
        self.min_battery_percent = percent;
        self
    }

    pub fn with_matcher(mut self, matcher: MatcherKind) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_speeds(mut self, speeds: CongestionSpeeds) -> Self {
        self.speeds = speeds;
        self
    }

    pub fn with_feature_defaults(mut self, defaults: StaticFeatureDefaults) -> Self {
        self.feature_defaults = defaults;
        self
    }

    pub fn with_holidays(mut self, holidays: HolidayCalendar) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn with_distance_cache_size(mut self, size: usize) -> Self {
        self.distance_cache_size = size;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn with_label_encoders_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.label_encoders_path = Some(path.into());
        self
    }

    pub fn with_fleet_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fleet_path = Some(path.into());
        self
    }
}
