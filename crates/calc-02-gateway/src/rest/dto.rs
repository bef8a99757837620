//! REST request and response bodies.

use crate::domain::error::ComputeError;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::str::FromStr;

/// Body of `POST /calculate`.
///
/// Operands are kept as raw JSON text so that both `2.5` and `"2.5"` are
/// accepted, a JSON number keeps every digit of its literal, and a missing
/// operand can be told apart from a malformed one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalculationRequest {
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub a: Option<Box<RawValue>>,
    #[serde(default)]
    pub b: Option<Box<RawValue>>,
}

/// A request that passed boundary validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCalculation {
    pub operation: String,
    pub a: BigDecimal,
    pub b: BigDecimal,
}

impl CalculationRequest {
    /// Check presence first, then decimal syntax.
    pub fn validate(self) -> Result<ValidCalculation, ComputeError> {
        let operation = self
            .operation
            .ok_or_else(|| ComputeError::validation("Operation cannot be null"))?;
        let a = self
            .a
            .ok_or_else(|| ComputeError::validation("First number cannot be null"))?;
        let b = self
            .b
            .ok_or_else(|| ComputeError::validation("Second number cannot be null"))?;

        let a = parse_decimal(&a)
            .ok_or_else(|| ComputeError::validation("First number is not a valid decimal"))?;
        let b = parse_decimal(&b)
            .ok_or_else(|| ComputeError::validation("Second number is not a valid decimal"))?;

        Ok(ValidCalculation { operation, a, b })
    }
}

/// Parse a JSON number literal or a decimal string. Numbers are read from
/// their source text, never through `f64`.
fn parse_decimal(raw: &RawValue) -> Option<BigDecimal> {
    let text = raw.get();
    match text.as_bytes().first()? {
        b'"' => {
            let s: String = serde_json::from_str(text).ok()?;
            BigDecimal::from_str(s.trim()).ok()
        }
        b'-' | b'0'..=b'9' => BigDecimal::from_str(text).ok(),
        _ => None,
    }
}

/// Body of every `/calculate` answer; exactly one field is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalculationResponse {
    pub fn success(result: BigDecimal) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pending: usize,
}
