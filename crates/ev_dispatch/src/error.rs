use thiserror::Error;

use crate::fleet::VehicleId;
use crate::rides::{RideId, RideStatus};

/// How a [`DispatchError`] should be surfaced to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PreconditionFailed,
    Forbidden,
}

/// Client-visible failures of the ride orchestrator. None of them leaves a
/// partial mutation behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Ride {0} not found")]
    RideNotFound(RideId),
    #[error("Vehicle {0} not found")]
    VehicleNotFound(VehicleId),
    #[error("No available drivers found")]
    NoVehiclesAvailable,
    #[error("Could not match a driver")]
    NoMatch,
    #[error("Driver {driver} is not assigned to ride {ride}")]
    NotAssigned { ride: RideId, driver: VehicleId },
    #[error("Ride {ride} cannot move from {from} to {to}")]
    InvalidTransition {
        ride: RideId,
        from: RideStatus,
        to: RideStatus,
    },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::RideNotFound(_) | DispatchError::VehicleNotFound(_) => {
                ErrorKind::NotFound
            }
            DispatchError::NoVehiclesAvailable
            | DispatchError::NoMatch
            | DispatchError::InvalidTransition { .. } => ErrorKind::PreconditionFailed,
            DispatchError::NotAssigned { .. } => ErrorKind::Forbidden,
        }
    }
}

/// Why a model-path fare could not be produced. Always recovered locally by the
/// analytic fallback; never returned to callers of the orchestrator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("model artifact is not fitted")]
    NotFitted,
    #[error("{component} expects {expected} features, got {actual}")]
    DimensionMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("feature {name} is not finite: {value}")]
    NonFiniteFeature { name: String, value: f64 },
    #[error("tree {tree} is malformed: {reason}")]
    MalformedTree { tree: usize, reason: String },
    #[error("regressor produced a non-finite fare: {0}")]
    NonFiniteOutput(f64),
    #[error("regressor failed: {0}")]
    Regressor(String),
}

/// Failure to load a model, encoder or fleet artifact from disk.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("artifact is inconsistent: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}
