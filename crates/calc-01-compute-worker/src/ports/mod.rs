//! Ports Layer
//!
//! - Inbound: `Calculator`, the API the worker loop drives.
//! - Outbound: responses leave through `shared_bus::EventPublisher`.

pub mod inbound;

pub use inbound::Calculator;
pub use shared_bus::EventPublisher;
