//! # Shared Bus - Message Bus for the Calculator Flow
//!
//! The gateway and the compute worker never call each other directly. The
//! gateway publishes `ComputationRequested` on the request channel. The
//! worker publishes `ComputationCompleted` on the response channel.
//!
//! ```text
//! ┌──────────────┐  calc-requests   ┌──────────────┐
//! │   Gateway    │ ───────────────▶ │    Worker    │
//! │              │                  │              │
//! │              │ ◀─────────────── │              │
//! └──────────────┘  calc-responses  └──────────────┘
//! ```
//!
//! ## Delivery
//!
//! - Broadcast semantics: every live subscription whose filter matches sees
//!   the message once. Messages published before a subscription exists are
//!   not replayed.
//! - At most once: a subscriber that lags behind the channel capacity loses
//!   the overflowed messages (logged, never fatal).
//! - No ordering guarantee is relied upon across correlation ids.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{BusMessage, CalcEvent, ChannelFilter};
pub use publisher::{EventPublisher, InMemoryEventBus, PublishError};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum messages buffered per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default channel carrying computation requests.
pub const DEFAULT_REQUEST_CHANNEL: &str = "calc-requests";

/// Default channel carrying computation responses.
pub const DEFAULT_RESPONSE_CHANNEL: &str = "calc-responses";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_channels_differ() {
        assert_ne!(DEFAULT_REQUEST_CHANNEL, DEFAULT_RESPONSE_CHANNEL);
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
