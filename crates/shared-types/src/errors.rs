//! # Error Types
//!
//! Failure taxonomy shared by the worker, the bus contract and the gateway.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Message sent for any unexpected worker failure. Internal detail stays in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Message reported to a caller whose response never arrived.
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Why a computation did not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// Missing or malformed operand or operation name at the front door.
    Validation,
    /// Operation name not known to the registry.
    Unsupported,
    /// Arithmetic rule violation, e.g. division by zero.
    DomainError,
    /// No response arrived within the deadline.
    Timeout,
    /// Unexpected failure inside the worker. Never carries internal detail.
    Internal,
}

impl FailureReason {
    /// Stable lowercase label, used for metrics and log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unsupported => "unsupported",
            Self::DomainError => "domain_error",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed computation: a reason tag plus a caller-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ComputationFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl ComputationFailure {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// Violations of the wire contract detected while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Response carried both `result` and `errorMessage`.
    #[error("response for {correlation_id} carries both result and errorMessage")]
    BothOutcomes { correlation_id: String },

    /// Response carried neither `result` nor `errorMessage`.
    #[error("response for {correlation_id} carries neither result nor errorMessage")]
    NoOutcome { correlation_id: String },
}
