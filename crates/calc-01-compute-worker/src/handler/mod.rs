//! Handler Layer
//!
//! Drives the worker from the bus: one request in, one response out.

pub mod worker;

pub use worker::ComputeWorker;
