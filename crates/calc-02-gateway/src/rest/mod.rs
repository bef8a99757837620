//! REST surface: `/calculate` plus the admin endpoints.

pub mod dto;
pub mod handlers;

pub use dto::{CalculationRequest, CalculationResponse, HealthResponse, ValidCalculation};
