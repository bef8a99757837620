//! # CALC-01 Compute Worker
//!
//! Consumes computation requests from the bus, evaluates them and publishes
//! one response per request, addressed by the request's correlation id.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure arithmetic, no I/O
//!   - `Operation`: closed set of `sum`, `subtraction`, `multiplication`, `division`
//!   - `OperationRegistry`: case-insensitive name → operation table built at startup
//!   - `RoundingRule` / `ScalePolicy`: fixed-scale rescaling rules
//!   - `ArithmeticConfig` / `WorkerConfig`: configuration with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `Calculator`: driving port (evaluate one operation)
//!   - `EventPublisher` (from `shared-bus`): driven port for responses
//!
//! - **Service Layer** (`service/`): `CalculatorService` implements `Calculator`
//!
//! - **Handler Layer** (`handler/`): `ComputeWorker` drives the bus loop
//!
//! ## Failure Mapping
//!
//! | Failure | Reason | Message |
//! |---------|--------|---------|
//! | unknown name | `Unsupported` | `Unsupported operation: <name>` |
//! | zero divisor | `DomainError` | `Division by zero` |
//! | anything else, panics included | `Internal` | `Internal server error` |
//!
//! The worker never stops consuming because of a failed request, and never
//! retries a response it could not publish.
//!
//! ## Usage Example
//!
//! ```ignore
//! use calc_01_compute_worker::{ArithmeticConfig, CalculatorService, Calculator};
//!
//! let service = CalculatorService::from_config(&ArithmeticConfig::default())?;
//! let quotient = service.calculate("DIVISION", &"6.0".parse()?, &"2.0".parse()?)?;
//! assert_eq!(quotient.to_string(), "3.0000000000");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod error;
pub mod handler;
pub mod ports;
pub mod service;

pub use domain::{
    ArithmeticConfig, Operation, OperationRegistry, RoundingMode, RoundingRule, ScalePolicy, WorkerConfig,
};
pub use error::CalcError;
pub use handler::ComputeWorker;
pub use ports::Calculator;
pub use service::CalculatorService;
