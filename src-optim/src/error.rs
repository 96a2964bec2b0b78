//! Error types for the optimisers.
//!
//! Configuration problems are reported when an optimiser is built, domain
//! problems (a failing objective) and invocation problems when it is run.

use thiserror::Error;

/// Errors that can occur while building or running an optimiser.
#[derive(Debug, Error)]
pub enum OptimError {
    /// No bounds were given, so the problem has no dimension.
    #[error("bounds are empty: at least one (low, high) pair is required")]
    EmptyBounds,

    /// A bound pair is not strictly increasing or not finite.
    #[error("invalid bounds at index {index}: expected finite low < high, got ({low}, {high})")]
    InvalidBounds {
        /// Index of the invalid bound pair
        index: usize,
        /// The lower bound value
        low: f64,
        /// The upper bound value
        high: f64,
    },

    /// A vector does not have the dimension implied by the bounds.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension fixed by the bounds
        expected: usize,
        /// Dimension of the offending vector
        got: usize,
    },

    /// A hyperparameter required by the engine is absent.
    #[error("missing hyperparameter '{name}'")]
    MissingHyper {
        /// Hyperparameter name
        name: String,
    },

    /// A hyperparameter holds a value of the wrong kind.
    #[error("hyperparameter '{name}' must be {expected}")]
    HyperType {
        /// Hyperparameter name
        name: String,
        /// Human readable description of the expected kind
        expected: &'static str,
    },

    /// A hyperparameter has the right kind but an unusable value.
    #[error("invalid hyperparameter '{name}': {reason}")]
    InvalidHyper {
        /// Hyperparameter name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A run option such as `nruns` or `return_m` is not usable.
    #[error("invalid run option '{name}': {reason}")]
    InvalidRunOption {
        /// Option name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// The objective failed while evaluating a candidate.
    #[error("objective evaluation failed: {0}")]
    Objective(String),

    /// The objective returned NaN, which cannot be ranked.
    #[error("objective returned NaN at {x:?}")]
    NotANumber {
        /// The candidate that produced NaN
        x: Vec<f64>,
    },

    /// A dedicated thread pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Writing a result to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a result to JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for optimiser operations.
pub type Result<T> = std::result::Result<T, OptimError>;

impl OptimError {
    pub(crate) fn invalid_hyper(name: &str, reason: impl Into<String>) -> Self {
        OptimError::InvalidHyper { name: name.to_string(), reason: reason.into() }
    }

    /// Returns `true` for errors raised while building an optimiser.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            OptimError::EmptyBounds
                | OptimError::InvalidBounds { .. }
                | OptimError::DimensionMismatch { .. }
                | OptimError::MissingHyper { .. }
                | OptimError::HyperType { .. }
                | OptimError::InvalidHyper { .. }
        )
    }

    /// Returns `true` when the objective itself failed.
    pub fn is_domain_error(&self) -> bool {
        matches!(self, OptimError::Objective(_) | OptimError::NotANumber { .. })
    }

    /// Returns `true` for rejected run options.
    pub fn is_invocation_error(&self) -> bool {
        matches!(self, OptimError::InvalidRunOption { .. })
    }
}
