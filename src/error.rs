//! Error types for routine execution.

use thiserror::Error;

/// Failure reported by a refresh routine.
///
/// The retriever treats every routine outcome identically: a failed iteration
/// is logged and the loop proceeds to the next scheduling decision. These
/// variants exist so routines can report what went wrong with some structure
/// instead of swallowing it.
#[derive(Debug, Error)]
pub enum RoutineError {
    /// A backend request issued by the routine failed.
    #[error("request failed: {reason}")]
    Request {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// Any other failure surfaced by the routine.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RoutineError {
    /// Create a request failure from a displayable reason.
    pub fn request(reason: impl Into<String>) -> Self {
        Self::Request {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_display() {
        let err = RoutineError::request("503 from backend");
        assert_eq!(err.to_string(), "request failed: 503 from backend");
    }

    #[test]
    fn test_other_wraps_anyhow() {
        let err: RoutineError = anyhow::anyhow!("parse failure").into();
        assert_eq!(err.to_string(), "parse failure");
    }
}
