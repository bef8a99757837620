//! # Shared Types Crate
//!
//! The message contract between the gateway and the compute worker.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: request and response schemas are defined here
//!   and nowhere else.
//! - **Exactly One Outcome**: a `ComputationResponse` carries either a result
//!   or an error message. The type cannot represent both or neither, and the
//!   wire decoder rejects documents that try.
//! - **Opaque Correlation**: `CorrelationId` is a random 128-bit token that is
//!   echoed unchanged from request to response.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod correlation;
pub mod errors;
pub mod messages;

pub use bigdecimal::BigDecimal;
pub use correlation::CorrelationId;
pub use errors::{
    ComputationFailure, ContractError, FailureReason, INTERNAL_ERROR_MESSAGE, TIMEOUT_MESSAGE,
};
pub use messages::{ComputationRequest, ComputationResponse, Outcome};
