//! Inbound Ports (Driving Ports)

use bigdecimal::BigDecimal;

use crate::error::CalcError;

/// Evaluates one named operation.
///
/// Implementations must be pure with respect to the operands: they are
/// borrowed and never mutated.
pub trait Calculator: Send + Sync {
    fn calculate(
        &self,
        operation: &str,
        a: &BigDecimal,
        b: &BigDecimal,
    ) -> Result<BigDecimal, CalcError>;
}
