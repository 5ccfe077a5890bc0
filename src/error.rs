//! Error types shared by every layer of the tuner.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TuneError>;

/// Everything that can go wrong while loading, searching or measuring.
///
/// `Parse` and `CrossoverShape` are usage bugs and abort the operation that
/// raised them. `ProcessSpawn` and `ProcessTimeout` are expected per
/// evaluation and are folded into the worst fitness by the search layer.
#[derive(Error, Debug)]
pub enum TuneError {
    #[error("malformed declaration at line {line}: {text:?}")]
    Parse { line: usize, text: String },

    #[error("unsupported parameter type {ttype} for {key}")]
    UnsupportedType { key: String, ttype: String },

    #[error("failed to spawn {program}: {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process exceeded its budget of {0:?}")]
    ProcessTimeout(Duration),

    #[error("crossover between configurations of different shape: {reason}")]
    CrossoverShape { reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("default run timed out after {0:?}; set a longer --target-tool-timeout")]
    BaselineTimeout(Duration),

    #[error("default run of the target tool failed")]
    BaselineFailed,

    #[error("cancelled")]
    Cancelled,

    #[error("worker error: {0}")]
    Worker(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TuneError {
    /// Whether this error only invalidates a single measurement.
    pub fn is_per_evaluation(&self) -> bool {
        matches!(
            self,
            TuneError::ProcessSpawn { .. } | TuneError::ProcessTimeout(_)
        )
    }
}
