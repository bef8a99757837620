//! # Event Publisher
//!
//! Defines the publishing side of the bus.

use crate::events::{BusMessage, CalcEvent, ChannelFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Errors from publishing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The bus has been closed and accepts no more messages.
    #[error("event bus closed")]
    Closed,

    /// The transport rejected the message.
    #[error("transport error on channel {channel}: {reason}")]
    Transport { channel: String, reason: String },
}

/// Trait for publishing events to a named channel.
///
/// This is the outbound port both the gateway and the worker depend on.
/// Tests substitute their own implementations to simulate transport faults.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to `channel`.
    ///
    /// Returns the number of live subscribers the message was handed to.
    /// Zero receivers is not an error: the message is simply lost.
    async fn publish(&self, channel: &str, event: CalcEvent) -> Result<usize, PublishError>;

    /// Total publish attempts.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// Suitable for running gateway and worker in one process; a deployment that
/// splits them would put a broker-backed `EventPublisher` here instead.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<BusMessage>,

    /// Active subscription count by filter key.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    events_published: AtomicU64,

    closed: AtomicBool,

    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with the given per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    /// Subscribe to messages matching a filter.
    ///
    /// Only messages published after this call are delivered.
    #[must_use]
    pub fn subscribe(&self, filter: ChannelFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let key = filter.key();

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(key.clone()).or_insert(0) += 1;
        }

        debug!(channels = ?filter.channels, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), key)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Number of live subscriptions created with exactly this filter.
    #[must_use]
    pub fn subscriptions_for(&self, filter: &ChannelFilter) -> usize {
        self.subscriptions
            .read()
            .ok()
            .and_then(|subs| subs.get(&filter.key()).copied())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reject all further publishes.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        debug!("Event bus closed");
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, channel: &str, event: CalcEvent) -> Result<usize, PublishError> {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        if self.is_closed() {
            return Err(PublishError::Closed);
        }

        let kind = event.kind();
        let correlation_id = event.correlation_id();

        match self.sender.send(BusMessage::new(channel, event)) {
            Ok(receivers) => {
                debug!(
                    channel,
                    kind,
                    correlation_id = %correlation_id,
                    receivers,
                    "Event published"
                );
                Ok(receivers)
            }
            Err(_) => {
                warn!(
                    channel,
                    kind,
                    correlation_id = %correlation_id,
                    "Event dropped (no receivers)"
                );
                Ok(0)
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
