//! Error types for the compute worker

use shared_types::FailureReason;
use thiserror::Error;

/// Errors raised while resolving or evaluating an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Operand scale {scale} is outside the supported range")]
    ScaleOutOfRange { scale: i64 },

    #[error("Operation registered twice: {0}")]
    DuplicateOperation(String),

    #[error("Invalid arithmetic configuration: {0}")]
    InvalidConfig(String),
}

impl CalcError {
    /// Failure reason reported across the bus.
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::UnsupportedOperation(_) => FailureReason::Unsupported,
            Self::DivisionByZero | Self::ScaleOutOfRange { .. } => FailureReason::DomainError,
            Self::DuplicateOperation(_) | Self::InvalidConfig(_) => FailureReason::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_wire_contract() {
        assert_eq!(
            CalcError::UnsupportedOperation("frobnicate".into()).to_string(),
            "Unsupported operation: frobnicate"
        );
        assert_eq!(CalcError::DivisionByZero.to_string(), "Division by zero");
    }

    #[test]
    fn test_reasons() {
        assert_eq!(
            CalcError::UnsupportedOperation("x".into()).reason(),
            FailureReason::Unsupported
        );
        assert_eq!(CalcError::DivisionByZero.reason(), FailureReason::DomainError);
        assert_eq!(
            CalcError::DuplicateOperation("sum".into()).reason(),
            FailureReason::Internal
        );
    }
}
