//! Domain Layer - Pure arithmetic
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - Operands are borrowed and never mutated

pub mod config;
pub mod operation;
pub mod registry;
pub mod rounding;

pub use config::{ArithmeticConfig, WorkerConfig};
pub use operation::Operation;
pub use registry::OperationRegistry;
pub use bigdecimal::RoundingMode;
pub use rounding::{divide_to_scale, RoundingRule, ScalePolicy, MAX_OPERAND_SCALE};
