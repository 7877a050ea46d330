//! Error types for configuration and model execution.

use thiserror::Error;

/// Errors raised while loading or validating a [`ModelConfig`](crate::config::ModelConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("population size must be positive")]
    EmptyPopulation,

    #[error("{field} must not be empty")]
    EmptyDistribution { field: &'static str },

    #[error("{field} has {actual} entries but the age distribution has {expected} bands")]
    AgeArrayLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field} must be finite and non-negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be a probability in [0, 1] (got {value})")]
    NotAProbability { field: &'static str, value: f64 },
}

/// Errors surfaced by the model facade and the runner.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
