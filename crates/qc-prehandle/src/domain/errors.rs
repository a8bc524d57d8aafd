//! Error types for pre-handle
//!
//! Two failure classes flow through the pipeline. A `PreCheck` failure is a
//! validation outcome with a response code and becomes part of the result.
//! An `Unexpected` failure is a fault in a collaborator and is contained as
//! an unknown failure.

use std::time::Duration;

use shared_types::{PreCheckError, ResponseCode};
use thiserror::Error;

/// Failure raised by a parser, router or the requirement accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreHandleError {
    /// Validation failure with a response code
    #[error(transparent)]
    PreCheck(#[from] PreCheckError),

    /// Any other failure
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl PreHandleError {
    pub fn pre_check(code: ResponseCode) -> Self {
        Self::PreCheck(PreCheckError::new(code))
    }

    pub fn unexpected(cause: impl std::fmt::Display) -> Self {
        Self::Unexpected(cause.to_string())
    }

    /// The response code of a validation failure.
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            Self::PreCheck(e) => Some(e.code()),
            Self::Unexpected(_) => None,
        }
    }
}

/// Failure to submit keys for signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Worker pool could not be created or has shut down
    #[error("Verification pool unavailable: {0}")]
    PoolUnavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A pending verification was not resolved in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Signature verification not resolved within {0:?}")]
pub struct VerificationTimeout(pub Duration);

/// Pipeline construction errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_check_conversion() {
        let err: PreHandleError = PreCheckError::new(ResponseCode::InvalidAccountId).into();
        assert_eq!(err.response_code(), Some(ResponseCode::InvalidAccountId));
        assert_eq!(PreHandleError::unexpected("boom").response_code(), None);
    }
}
