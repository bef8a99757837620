//! # Bus Events
//!
//! Payloads carried on the bus and the channel filter used by subscribers.

use shared_types::{ComputationRequest, ComputationResponse, CorrelationId};
use std::time::SystemTime;

/// Every payload the calculator flow puts on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcEvent {
    /// Gateway → worker.
    ComputationRequested(ComputationRequest),
    /// Worker → gateway.
    ComputationCompleted(ComputationResponse),
}

impl CalcEvent {
    /// Correlation id carried by the payload.
    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        match self {
            Self::ComputationRequested(req) => req.correlation_id,
            Self::ComputationCompleted(resp) => resp.correlation_id(),
        }
    }

    /// Short name for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ComputationRequested(_) => "computation_requested",
            Self::ComputationCompleted(_) => "computation_completed",
        }
    }
}

/// An event addressed to a named channel.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub channel: String,
    pub event: CalcEvent,
    pub published_at: SystemTime,
}

impl BusMessage {
    pub fn new(channel: impl Into<String>, event: CalcEvent) -> Self {
        Self {
            channel: channel.into(),
            event,
            published_at: SystemTime::now(),
        }
    }
}

/// Selects which channels a subscription receives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFilter {
    /// Channels to receive. Empty means every channel.
    pub channels: Vec<String>,
}

impl ChannelFilter {
    /// Receive every channel.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Receive a single channel.
    pub fn channel(name: impl Into<String>) -> Self {
        Self {
            channels: vec![name.into()],
        }
    }

    /// Receive any of the given channels.
    pub fn channels<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: names.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn matches(&self, message: &BusMessage) -> bool {
        self.channels.is_empty() || self.channels.iter().any(|c| *c == message.channel)
    }

    /// Key used to count subscriptions per filter.
    pub(crate) fn key(&self) -> String {
        if self.channels.is_empty() {
            "*".to_string()
        } else {
            self.channels.join(",")
        }
    }
}
