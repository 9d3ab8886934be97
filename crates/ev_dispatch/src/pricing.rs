//! Fare prediction with an analytic fallback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PredictionError;
use crate::features::{FeatureName, FeatureSignals, FeatureVector};
use crate::model::ModelArtifact;

/// Base fare in rupees.
pub const BASE_FARE: f64 = 40.0;

/// Per-kilometer rate in rupees.
pub const PER_KM_RATE: f64 = 12.0;

/// Lowest fare the model path may quote.
pub const MINIMUM_FARE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub base_fare: f64,
    pub per_km_rate: f64,
    pub minimum_fare: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fare: BASE_FARE,
            per_km_rate: PER_KM_RATE,
            minimum_fare: MINIMUM_FARE,
        }
    }
}

impl PricingConfig {
    /// Formula: `fare = (base_fare + distance_km * per_km_rate) * surge`.
    ///
    /// No floor is applied; the base fare already sits at the minimum.
    pub fn fallback_fare(&self, distance_km: f64, surge_multiplier: f64) -> f64 {
        (self.base_fare + distance_km * self.per_km_rate) * surge_multiplier
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NoModel,
    Failed(PredictionError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FarePrediction {
    Predicted(f64),
    Fallback { fare: f64, reason: FallbackReason },
}

impl FarePrediction {
    pub fn fare(&self) -> f64 {
        match self {
            FarePrediction::Predicted(fare) => *fare,
            FarePrediction::Fallback { fare, .. } => *fare,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FarePrediction::Fallback { .. })
    }
}

/// Prices rides from collected signals. Holds an optional shared model; without
/// one every fare comes from the formula.
#[derive(Debug, Clone, Default)]
pub struct FarePredictor {
    artifact: Option<Arc<ModelArtifact>>,
    config: PricingConfig,
}

impl FarePredictor {
    pub fn new(config: PricingConfig) -> Self {
        Self {
            artifact: None,
            config,
        }
    }

    pub fn with_artifact(mut self, artifact: Arc<ModelArtifact>) -> Self {
        self.artifact = Some(artifact);
        self
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        self.artifact.as_deref()
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn predict(&self, signals: &FeatureSignals) -> FarePrediction {
        let Some(artifact) = self.artifact.as_deref() else {
            return FarePrediction::Fallback {
                fare: self.fallback(signals),
                reason: FallbackReason::NoModel,
            };
        };

        let vector = FeatureVector::assemble(artifact.feature_columns(), signals);
        match artifact.predict(&vector) {
            Ok(raw) => FarePrediction::Predicted(raw.max(self.config.minimum_fare)),
            Err(err) => {
                warn!(error = %err, "fare model failed, using fallback formula");
                FarePrediction::Fallback {
                    fare: self.fallback(signals),
                    reason: FallbackReason::Failed(err),
                }
            }
        }
    }

    /// Fare only; the prediction path is not exposed.
    pub fn predict_fare(&self, signals: &FeatureSignals) -> f64 {
        self.predict(signals).fare()
    }

    fn fallback(&self, signals: &FeatureSignals) -> f64 {
        let distance = signals.get(&FeatureName::DistanceKm).unwrap_or(0.0);
        let surge = signals.get(&FeatureName::SurgeMultiplier).unwrap_or(1.0);
        self.config.fallback_fare(distance, surge)
    }
}
