//! Error types for Afinar operations.
//!
//! Per-job failures during a grid search are *values*
//! ([`Evaluation::Failure`](crate::executor::Evaluation)), not errors; this
//! module covers the structural failures that are surfaced to the caller.

use thiserror::Error;

/// Main error type for Afinar operations.
///
/// # Examples
///
/// ```
/// use afinar::error::AfinarError;
///
/// let err = AfinarError::InvalidGrid {
///     message: "axis 'alpha' has no candidate values".to_string(),
/// };
/// assert!(err.to_string().contains("invalid parameter grid"));
/// ```
#[derive(Debug, Error)]
pub enum AfinarError {
    /// The parameter grid specification is empty or malformed.
    #[error("invalid parameter grid: {message}")]
    InvalidGrid {
        /// What was wrong with the grid
        message: String,
    },

    /// Every job in the validation-set path failed, so no candidate model
    /// exists to select.
    #[error("all {attempted} grid search job(s) failed, no model to select")]
    NoSuccessfulJobs {
        /// Number of parameter settings that were attempted
        attempted: usize,
    },

    /// The held model does not expose the requested capability.
    #[error("the selected model does not support {operation}")]
    Unsupported {
        /// Name of the missing capability (e.g. "predict_proba")
        operation: &'static str,
    },

    /// A result accessor or delegated operation was invoked before `fit`.
    #[error("grid search has not been fitted yet, call fit() first")]
    NotFitted,

    /// An estimator failure surfaced outside the isolated worker path
    /// (e.g. while refitting the cross-validation winner).
    #[error("estimator error: {0}")]
    Estimator(String),

    /// The worker pool could not be constructed.
    #[error("worker pool error: {0}")]
    ThreadPool(String),

    /// Generic error with string message.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for AfinarError {
    fn from(msg: &str) -> Self {
        AfinarError::Other(msg.to_string())
    }
}

impl From<String> for AfinarError {
    fn from(msg: String) -> Self {
        AfinarError::Other(msg)
    }
}

impl AfinarError {
    /// Create an invalid-grid error with descriptive context.
    #[must_use]
    pub fn invalid_grid(message: impl Into<String>) -> Self {
        Self::InvalidGrid {
            message: message.into(),
        }
    }

    /// Create an estimator error from any displayable failure.
    #[must_use]
    pub fn estimator(err: impl std::fmt::Display) -> Self {
        Self::Estimator(err.to_string())
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, AfinarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_grid_display() {
        let err = AfinarError::invalid_grid("grid has no axes");
        let msg = err.to_string();
        assert!(msg.contains("invalid parameter grid"));
        assert!(msg.contains("grid has no axes"));
    }

    #[test]
    fn test_no_successful_jobs_display() {
        let err = AfinarError::NoSuccessfulJobs { attempted: 12 };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("failed"));
    }

    #[test]
    fn test_unsupported_display() {
        let err = AfinarError::Unsupported {
            operation: "predict_proba",
        };
        assert!(err.to_string().contains("predict_proba"));
    }

    #[test]
    fn test_not_fitted_display() {
        let err = AfinarError::NotFitted;
        assert!(err.to_string().contains("fit()"));
    }

    #[test]
    fn test_from_str() {
        let err: AfinarError = "boom".into();
        assert!(matches!(err, AfinarError::Other(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_from_string() {
        let err: AfinarError = "boom".to_string().into();
        assert!(matches!(err, AfinarError::Other(_)));
    }

    #[test]
    fn test_estimator_helper() {
        let err = AfinarError::estimator("singular matrix");
        let msg = err.to_string();
        assert!(msg.contains("estimator error"));
        assert!(msg.contains("singular matrix"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AfinarError>();
    }
}
