//! Error types for trueno-ab
//!
//! Assignment itself never fails: unknown experiments, malformed cookies and
//! missing storage all degrade to a usable answer. Errors only surface while
//! building or installing configuration.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-ab error types
#[derive(Error, Debug)]
pub enum Error {
    /// An experiment definition violates a registry invariant
    #[error("Invalid experiment '{experiment_id}': {reason}")]
    InvalidExperiment {
        /// Identifier of the offending experiment
        experiment_id: String,
        /// What was wrong with it
        reason: String,
    },

    /// Registry or engine configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// `registry::install` was called more than once
    #[error("Experiment registry already installed\nThe registry is load-once; build a complete registry before installing it")]
    RegistryAlreadyInstalled,

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(experiment_id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidExperiment {
            experiment_id: experiment_id.to_string(),
            reason: reason.into(),
        }
    }
}
