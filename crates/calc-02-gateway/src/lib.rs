//! # Calc Gateway
//!
//! HTTP front door of the calculator. Each `/calculate` call is answered
//! synchronously, although the computation itself happens on a worker that
//! is only reachable through the bus.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          CALC GATEWAY                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  HTTP (axum)                                                    │
//! │    POST /calculate ──► validate ──► CorrelationBridge::compute  │
//! │    GET  /health, /pending, /metrics                             │
//! │                                           │        ▲            │
//! │                     register + publish    │        │ outcome    │
//! │                                           ▼        │            │
//! │                            ┌─────────────────────────────┐      │
//! │                            │     PendingRequestStore     │      │
//! │                            │  correlation id ─► oneshot  │      │
//! │                            └─────────────────────────────┘      │
//! │                                           ▲                     │
//! │                                 complete  │                     │
//! │                                 ResponseListener                │
//! └───────────────────────────────────────────┬─────────────────────┘
//!             calc-requests ▼                 ▲ calc-responses
//!                         ┌─────────────────────────┐
//!                         │     Compute worker      │
//!                         └─────────────────────────┘
//! ```
//!
//! ## Call lifecycle
//!
//! `Created → Pending → {Fulfilled | TimedOut | Cancelled}`. The only
//! serialization point is the remove-if-present on the pending table: the
//! listener (`complete`), the deadline (`expire`) and a dropped caller
//! (`cancel`) race for it and exactly one wins. Responses that lose are
//! counted as stale and discarded.
//!
//! ## Failure mapping
//!
//! | Reason        | HTTP | Example message                     |
//! |---------------|------|-------------------------------------|
//! | `Validation`  | 400  | `First number cannot be null`       |
//! | `Unsupported` | 400  | `Unsupported operation: frobnicate` |
//! | `DomainError` | 400  | `Division by zero`                  |
//! | `Timeout`     | 504  | `Request timed out`                 |
//! | `Internal`    | 500  | `Internal server error`             |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod ipc;
pub mod middleware;
pub mod rest;
pub mod service;

pub use domain::{
    ComputeError, ConfigError, GatewayConfig, GatewayError, PendingRequestStore, PendingSnapshot,
};
pub use ipc::{CorrelationBridge, ResponseListener};
pub use service::{AppState, CalcGatewayService};
