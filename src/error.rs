use crate::Backend;
use thiserror::Error;

/// Errors produced by grids, engines and the benchmark harness.
#[derive(Error, Debug)]
pub enum LifeError {
    /// Invalid probability, non-positive dimension, zero repeat count and so on.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Non-rectangular pattern or a grid that does not match an engine's buffers.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// The execution context for a backend could not be acquired.
    #[error("backend `{backend}` is unavailable: {reason}")]
    BackendUnavailable { backend: Backend, reason: String },

    /// Device-side failure surfaced while waiting for submitted work.
    #[error("synchronization failed: {0}")]
    Synchronization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl LifeError {
    pub(crate) fn unavailable(backend: Backend, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend,
            reason: reason.into(),
        }
    }

    /// Whether the harness may skip the failed combination and carry on.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, LifeError>;
