//! Gateway domain: configuration, errors and the pending request table.

pub mod config;
pub mod error;
pub mod pending;

pub use config::{ChannelConfig, ConfigError, GatewayConfig, HttpConfig, DEFAULT_REQUEST_TIMEOUT};
pub use error::{ComputeError, GatewayError};
pub use pending::{PendingGuard, PendingRequestStore, PendingSnapshot, PendingStats};
