//! HTTP middleware.

pub mod tracing;

pub use self::tracing::{TracingLayer, TracingService, REQUEST_ID_HEADER};
