//! Calculator service: registry lookup plus evaluation.

use bigdecimal::BigDecimal;
use tracing::debug;

use crate::domain::{ArithmeticConfig, OperationRegistry};
use crate::error::CalcError;
use crate::ports::Calculator;

/// Default `Calculator` backed by an `OperationRegistry`.
#[derive(Clone, Debug)]
pub struct CalculatorService {
    registry: OperationRegistry,
}

impl CalculatorService {
    pub fn new(registry: OperationRegistry) -> Self {
        Self { registry }
    }

    /// Build the registry from configuration. Fails on invalid scales.
    pub fn from_config(config: &ArithmeticConfig) -> Result<Self, CalcError> {
        let registry = OperationRegistry::from_config(config)?;
        debug!(operations = ?registry.names(), "Operation registry built");
        Ok(Self::new(registry))
    }

    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }
}

impl Calculator for CalculatorService {
    fn calculate(
        &self,
        operation: &str,
        a: &BigDecimal,
        b: &BigDecimal,
    ) -> Result<BigDecimal, CalcError> {
        self.registry.resolve(operation)?.apply(a, b)
    }
}
