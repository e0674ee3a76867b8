//! Environment errors.

use thiserror::Error;

/// Invalid environment configuration, detected when the environment is constructed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Objective name is not one of `makespan`, `energy_consumption`, `edp`.
    #[error("unknown objective: {0}")]
    UnknownObjective(String),
    /// Observation profile is not one of `minimal`, `small`, `normal`.
    #[error("unknown observation type: {0}")]
    UnknownObservation(String),
    /// Job selection name is not present in the registry.
    #[error("unknown job selection: {0}")]
    UnknownJobSelection(String),
    /// Core selection name is not present in the registry.
    #[error("unknown core selection: {0}")]
    UnknownCoreSelection(String),
    /// Queue sensitivity must be finite and strictly positive.
    #[error("queue sensitivity must be finite and positive, got {0}")]
    InvalidQueueSensitivity(f64),
    /// Range bounds are not finite or the lower bound exceeds the upper one.
    #[error("invalid range for {option}: [{low}, {high}]")]
    InvalidRange {
        /// Name of the option.
        option: &'static str,
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
    /// Job arrival rate must be finite and non-negative.
    #[error("arrival rate must be finite and non-negative, got {0}")]
    InvalidArrivalRate(f64),
    /// Required option is absent.
    #[error("missing required option: {0}")]
    MissingOption(&'static str),
    /// Config file can't be read or parsed.
    #[error("can't load config {path}: {reason}")]
    Load {
        /// Path to the config file.
        path: String,
        /// Underlying I/O or YAML error.
        reason: String,
    },
}

/// Environment error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Environment configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Action index is negative or not less than the number of actions.
    #[error("action {action} is out of range, action space has {action_count} actions")]
    ActionOutOfRange {
        /// Requested action index.
        action: i64,
        /// Size of the action space.
        action_count: usize,
    },
}
