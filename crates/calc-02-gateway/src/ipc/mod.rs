//! Bus communication for the gateway.
//!
//! The gateway talks to the compute worker only through the bus, using a
//! request/response pattern matched by correlation id.

pub mod handler;

pub use handler::{CorrelationBridge, ResponseListener};
