//! Pending request table.
//!
//! Maps correlation ids to the one-shot handle of the call waiting for them.
//! Every terminal transition goes through a remove-if-present on the map, so
//! whichever of the listener, the deadline or a cancellation removes the
//! entry first wins, and the others become no-ops.
//!
//! Flow:
//! 1. The bridge calls `register()` and gets an id plus a receiver
//! 2. The bridge publishes the request under that id
//! 3. The response listener calls `complete()` when the response arrives
//! 4. Otherwise the bridge calls `expire()` at the deadline, or the
//!    `PendingGuard` calls `cancel()` when the call is dropped

use calc_telemetry::{GATEWAY_PENDING_REQUESTS, GATEWAY_STALE_RESPONSES};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use shared_types::{CorrelationId, Outcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// A call waiting for its response
struct PendingRequest {
    /// Handle to fulfil
    sender: oneshot::Sender<Outcome>,
    /// When the call was registered
    created_at: Instant,
    /// Operation name (for logging)
    operation: String,
}

/// Statistics for the pending request table
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total calls registered
    pub total_registered: AtomicU64,
    /// Total calls fulfilled by a response
    pub total_completed: AtomicU64,
    /// Total calls that hit their deadline
    pub total_timeouts: AtomicU64,
    /// Total calls dropped by their caller
    pub total_cancelled: AtomicU64,
    /// Responses that found no waiting call
    pub stale_responses: AtomicU64,
}

/// Point-in-time view of the table, served by `/pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingSnapshot {
    pub pending: usize,
    pub registered: u64,
    pub completed: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    pub stale: u64,
}

/// Pending request table shared by the bridge and the response listener.
#[derive(Default)]
pub struct PendingRequestStore {
    pending: DashMap<CorrelationId, PendingRequest>,
    stats: PendingStats,
}

impl PendingRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call under a fresh correlation id.
    ///
    /// The id and its handle enter the table together; there is no moment
    /// where the id is visible without a waiter.
    pub fn register(&self, operation: &str) -> (CorrelationId, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let request = PendingRequest {
            sender: tx,
            created_at: Instant::now(),
            operation: operation.to_string(),
        };

        let correlation_id = loop {
            let candidate = CorrelationId::new();
            match self.pending.entry(candidate) {
                Entry::Occupied(_) => {
                    warn!(correlation_id = %candidate, "Correlation id collision, regenerating");
                }
                Entry::Vacant(slot) => {
                    slot.insert(request);
                    break candidate;
                }
            }
        };

        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
        GATEWAY_PENDING_REQUESTS.inc();

        debug!(
            correlation_id = %correlation_id,
            operation = operation,
            "Registered pending request"
        );

        (correlation_id, rx)
    }

    /// Fulfil a call with its outcome.
    ///
    /// Returns true if the call was still waiting and received the outcome.
    /// An unknown id (already timed out, cancelled, answered, or never
    /// issued) is counted as stale and otherwise ignored.
    pub fn complete(&self, correlation_id: CorrelationId, outcome: Outcome) -> bool {
        let Some(pending) = self.take(&correlation_id) else {
            self.stats.stale_responses.fetch_add(1, Ordering::Relaxed);
            GATEWAY_STALE_RESPONSES.inc();
            debug!(
                correlation_id = %correlation_id,
                "Discarding response for unknown or retired correlation id"
            );
            return false;
        };

        let response_time = pending.created_at.elapsed();
        match pending.sender.send(outcome) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    operation = pending.operation,
                    response_time_ms = response_time.as_millis(),
                    "Completed pending request"
                );
                true
            }
            Err(_) => {
                // The caller went away between our removal and the send.
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    operation = pending.operation,
                    "Pending request receiver dropped"
                );
                false
            }
        }
    }

    /// Retire a call whose deadline elapsed.
    ///
    /// Returns false if the entry was already gone, meaning a response won
    /// the race and is sitting in the caller's receiver.
    pub fn expire(&self, correlation_id: &CorrelationId) -> bool {
        match self.take(correlation_id) {
            Some(pending) => {
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(
                    correlation_id = %correlation_id,
                    operation = pending.operation,
                    elapsed_ms = pending.created_at.elapsed().as_millis(),
                    "Pending request timed out"
                );
                true
            }
            None => false,
        }
    }

    /// Retire a call whose caller gave up.
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        match self.take(correlation_id) {
            Some(pending) => {
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    operation = pending.operation,
                    "Pending request cancelled"
                );
                true
            }
            None => false,
        }
    }

    /// Drop guard that cancels `correlation_id` unless it was retired first.
    pub fn guard(&self, correlation_id: CorrelationId) -> PendingGuard<'_> {
        PendingGuard {
            store: self,
            correlation_id,
        }
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a correlation ID is pending
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }

    pub fn snapshot(&self) -> PendingSnapshot {
        PendingSnapshot {
            pending: self.pending_count(),
            registered: self.stats.total_registered.load(Ordering::Relaxed),
            completed: self.stats.total_completed.load(Ordering::Relaxed),
            timed_out: self.stats.total_timeouts.load(Ordering::Relaxed),
            cancelled: self.stats.total_cancelled.load(Ordering::Relaxed),
            stale: self.stats.stale_responses.load(Ordering::Relaxed),
        }
    }

    fn take(&self, correlation_id: &CorrelationId) -> Option<PendingRequest> {
        let (_, pending) = self.pending.remove(correlation_id)?;
        GATEWAY_PENDING_REQUESTS.dec();
        Some(pending)
    }
}

/// Cancels its entry when dropped, so a call abandoned mid-await leaves
/// nothing behind in the table.
pub struct PendingGuard<'a> {
    store: &'a PendingRequestStore,
    correlation_id: CorrelationId,
}

impl PendingGuard<'_> {
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.store.cancel(&self.correlation_id);
    }
}
