//! Gateway error types.
//!
//! `ComputeError` is what a caller of the bridge sees: a failure reason plus a
//! message that is safe to show. `GatewayError` covers the server itself.

use axum::http::StatusCode;
use shared_types::{ComputationFailure, FailureReason, INTERNAL_ERROR_MESSAGE, TIMEOUT_MESSAGE};

/// Definitive failure of one `compute` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ComputeError {
    pub reason: FailureReason,
    pub message: String,
}

impl ComputeError {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    /// Rejected at the boundary, never published
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Validation, message)
    }

    /// No response within the deadline
    pub fn timeout() -> Self {
        Self::new(FailureReason::Timeout, TIMEOUT_MESSAGE)
    }

    /// Unexpected failure; the detail goes to the log, not the caller
    pub fn internal() -> Self {
        Self::new(FailureReason::Internal, INTERNAL_ERROR_MESSAGE)
    }

    /// HTTP status the REST surface answers with.
    pub fn status_code(&self) -> StatusCode {
        match self.reason {
            FailureReason::Validation
            | FailureReason::Unsupported
            | FailureReason::DomainError => StatusCode::BAD_REQUEST,
            FailureReason::Timeout => StatusCode::GATEWAY_TIMEOUT,
            FailureReason::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ComputationFailure> for ComputeError {
    fn from(failure: ComputationFailure) -> Self {
        Self::new(failure.reason, failure.message)
    }
}

/// Gateway-level errors (not per call)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(std::io::Error),

    /// The HTTP server stopped with an error
    #[error("server error: {0}")]
    Server(std::io::Error),
}
