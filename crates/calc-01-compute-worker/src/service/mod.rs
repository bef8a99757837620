//! Service Layer
//!
//! Orchestrates domain logic behind the `Calculator` port.

pub mod calculator_service;

pub use calculator_service::CalculatorService;
