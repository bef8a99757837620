//! Worker configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use calc_01_compute_worker::domain::{ArithmeticConfig, RoundingMode, ScalePolicy};
//!
//! let config = ArithmeticConfig {
//!     division: ScalePolicy::new(4, RoundingMode::HalfEven),
//!     ..ArithmeticConfig::default()
//! };
//! config.validate()?;
//! ```

use bigdecimal::RoundingMode;
use serde::{Deserialize, Serialize};

use super::rounding::{ScalePolicy, MAX_OPERAND_SCALE};
use crate::error::CalcError;

/// Rescaling policy per operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArithmeticConfig {
    /// Default: 1 fractional digit, HALF_UP
    pub multiplication: ScalePolicy,
    /// Default: 10 fractional digits, HALF_UP
    pub division: ScalePolicy,
}

impl Default for ArithmeticConfig {
    fn default() -> Self {
        Self {
            multiplication: ScalePolicy::new(1, RoundingMode::HalfUp),
            division: ScalePolicy::new(10, RoundingMode::HalfUp),
        }
    }
}

impl ArithmeticConfig {
    pub fn validate(&self) -> Result<(), CalcError> {
        for (name, policy) in [
            ("multiplication", self.multiplication),
            ("division", self.division),
        ] {
            if !(0..=MAX_OPERAND_SCALE).contains(&policy.scale) {
                return Err(CalcError::InvalidConfig(format!(
                    "{name} scale must be between 0 and {MAX_OPERAND_SCALE}, got {}",
                    policy.scale
                )));
            }
        }
        Ok(())
    }
}

/// Compute worker configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Channel the worker consumes requests from
    pub request_channel: String,
    /// Channel the worker publishes responses to
    pub response_channel: String,
    /// Requests in flight at once; each is evaluated on the blocking pool
    pub concurrency: usize,
    pub arithmetic: ArithmeticConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            request_channel: shared_bus::DEFAULT_REQUEST_CHANNEL.to_string(),
            response_channel: shared_bus::DEFAULT_RESPONSE_CHANNEL.to_string(),
            concurrency: 16,
            arithmetic: ArithmeticConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<(), CalcError> {
        if self.request_channel.trim().is_empty() || self.response_channel.trim().is_empty() {
            return Err(CalcError::InvalidConfig(
                "channel names must not be empty".into(),
            ));
        }
        if self.request_channel == self.response_channel {
            return Err(CalcError::InvalidConfig(format!(
                "request and response channel are both {}",
                self.request_channel
            )));
        }
        if self.concurrency == 0 {
            return Err(CalcError::InvalidConfig(
                "concurrency must be at least 1".into(),
            ));
        }
        self.arithmetic.validate()
    }
}
