//! # Bus Messages
//!
//! Request and response payloads carried on the request and response
//! channels. Decimals travel as strings so no precision is lost in transit.
//!
//! ```text
//! Request:  {"operation":"sum","a":"10.5","b":"2.5","correlationId":"..."}
//! Response: {"correlationId":"...","result":"13.0"}
//!           {"correlationId":"...","errorMessage":"Division by zero","errorReason":"DOMAIN_ERROR"}
//! ```

use crate::correlation::CorrelationId;
use crate::errors::{ComputationFailure, ContractError, FailureReason};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Outcome of a single computation.
pub type Outcome = Result<BigDecimal, ComputationFailure>;

/// A computation submitted by the gateway, consumed by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationRequest {
    /// Operation name, matched case-insensitively by the worker.
    pub operation: String,
    #[serde(rename = "a")]
    pub operand_a: BigDecimal,
    #[serde(rename = "b")]
    pub operand_b: BigDecimal,
    pub correlation_id: CorrelationId,
}

impl ComputationRequest {
    pub fn new(
        correlation_id: CorrelationId,
        operation: impl Into<String>,
        operand_a: BigDecimal,
        operand_b: BigDecimal,
    ) -> Self {
        Self {
            operation: operation.into(),
            operand_a,
            operand_b,
            correlation_id,
        }
    }
}

/// The worker's answer to a `ComputationRequest`.
///
/// Holds exactly one of a result or a failure. Build it with
/// [`ComputationResponse::success`] or [`ComputationResponse::failure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResponseWire", into = "ResponseWire")]
pub struct ComputationResponse {
    correlation_id: CorrelationId,
    outcome: Outcome,
}

impl ComputationResponse {
    pub fn success(correlation_id: CorrelationId, result: BigDecimal) -> Self {
        Self {
            correlation_id,
            outcome: Ok(result),
        }
    }

    pub fn failure(
        correlation_id: CorrelationId,
        reason: FailureReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id,
            outcome: Err(ComputationFailure::new(reason, message)),
        }
    }

    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }

    #[must_use]
    pub fn result(&self) -> Option<&BigDecimal> {
        self.outcome.as_ref().ok()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(|f| f.message.as_str())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Flat wire shape of a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseWire {
    correlation_id: CorrelationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_reason: Option<FailureReason>,
}

impl TryFrom<ResponseWire> for ComputationResponse {
    type Error = ContractError;

    fn try_from(wire: ResponseWire) -> Result<Self, Self::Error> {
        let correlation_id = wire.correlation_id;
        let outcome = match (wire.result, wire.error_message) {
            (Some(result), None) => Ok(result),
            // Producers that predate `errorReason` only send the message.
            (None, Some(message)) => Err(ComputationFailure::new(
                wire.error_reason.unwrap_or(FailureReason::Internal),
                message,
            )),
            (Some(_), Some(_)) => {
                return Err(ContractError::BothOutcomes {
                    correlation_id: correlation_id.to_string(),
                })
            }
            (None, None) => {
                return Err(ContractError::NoOutcome {
                    correlation_id: correlation_id.to_string(),
                })
            }
        };
        Ok(Self {
            correlation_id,
            outcome,
        })
    }
}

impl From<ComputationResponse> for ResponseWire {
    fn from(response: ComputationResponse) -> Self {
        let (result, error_message, error_reason) = match response.outcome {
            Ok(value) => (Some(value), None, None),
            Err(failure) => (None, Some(failure.message), Some(failure.reason)),
        };
        Self {
            correlation_id: response.correlation_id,
            result,
            error_message,
            error_reason,
        }
    }
}
