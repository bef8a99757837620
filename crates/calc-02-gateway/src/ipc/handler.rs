//! Bus handlers: the correlation bridge and its response listener.

use crate::domain::config::GatewayConfig;
use crate::domain::error::ComputeError;
use crate::domain::pending::PendingRequestStore;
use bigdecimal::BigDecimal;
use calc_telemetry::{
    HistogramTimer, BUS_MESSAGES_PUBLISHED, GATEWAY_REQUESTS, GATEWAY_REQUEST_DURATION,
};
use futures::{Stream, StreamExt};
use shared_bus::{CalcEvent, EventPublisher};
use shared_types::{ComputationRequest, ComputationResponse, CorrelationId, Outcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

/// Turns one synchronous `compute` call into a request on the bus and waits,
/// for at most the configured deadline, for the response carrying the same
/// correlation id.
pub struct CorrelationBridge {
    /// Pending request table, shared with the `ResponseListener`
    pending: Arc<PendingRequestStore>,
    /// Outbound side of the bus
    publisher: Arc<dyn EventPublisher>,
    request_channel: String,
    timeout: Duration,
}

impl CorrelationBridge {
    pub fn new(
        pending: Arc<PendingRequestStore>,
        publisher: Arc<dyn EventPublisher>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            pending,
            publisher,
            request_channel: config.channels.request.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Evaluate `a <operation> b` on the worker.
    ///
    /// Always settles within the deadline (plus scheduling slack). Dropping
    /// the returned future retires the pending entry.
    pub async fn compute(
        &self,
        operation: &str,
        a: BigDecimal,
        b: BigDecimal,
    ) -> Result<BigDecimal, ComputeError> {
        let operation = operation.trim();
        if operation.is_empty() {
            let err = ComputeError::validation("Operation cannot be null");
            record_outcome(&Err(err.clone()));
            return Err(err);
        }
        let operation = operation.to_lowercase();

        let _timer = HistogramTimer::new(&GATEWAY_REQUEST_DURATION);
        let (correlation_id, rx) = self.pending.register(&operation);
        let _guard = self.pending.guard(correlation_id);
        let deadline = Instant::now() + self.timeout;

        let span = info_span!(
            "compute",
            correlation_id = %correlation_id,
            operation = %operation,
        );
        let result = self
            .exchange(correlation_id, operation, a, b, rx, deadline)
            .instrument(span)
            .await;

        record_outcome(&result);
        result
    }

    async fn exchange(
        &self,
        correlation_id: CorrelationId,
        operation: String,
        a: BigDecimal,
        b: BigDecimal,
        mut rx: oneshot::Receiver<Outcome>,
        deadline: Instant,
    ) -> Result<BigDecimal, ComputeError> {
        info!(a = %a, b = %b, "Sending calculation request");
        let request = ComputationRequest::new(correlation_id, operation, a, b);

        match self
            .publisher
            .publish(&self.request_channel, CalcEvent::ComputationRequested(request))
            .await
        {
            Ok(receivers) => {
                BUS_MESSAGES_PUBLISHED
                    .with_label_values(&[self.request_channel.as_str()])
                    .inc();
                if receivers == 0 {
                    warn!(channel = %self.request_channel, "No worker subscribed to request channel");
                } else {
                    debug!(receivers, "Request published");
                }
            }
            Err(e) => {
                // Reported to the caller the same way as a missing response.
                self.pending.expire(&correlation_id);
                warn!(channel = %self.request_channel, error = %e, "Failed to publish request");
                return Err(ComputeError::timeout());
            }
        }

        match tokio::time::timeout_at(deadline, &mut rx).await {
            Ok(Ok(outcome)) => outcome.map_err(ComputeError::from),
            Ok(Err(_)) => {
                error!("Completion handle dropped without an outcome");
                Err(ComputeError::internal())
            }
            Err(_) => {
                if self.pending.expire(&correlation_id) {
                    return Err(ComputeError::timeout());
                }
                // The listener removed the entry first, so the outcome is
                // already in the handle.
                match rx.await {
                    Ok(outcome) => outcome.map_err(ComputeError::from),
                    Err(_) => {
                        error!("Completion handle dropped without an outcome");
                        Err(ComputeError::internal())
                    }
                }
            }
        }
    }

    pub fn pending(&self) -> &Arc<PendingRequestStore> {
        &self.pending
    }

    pub fn request_channel(&self) -> &str {
        &self.request_channel
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn record_outcome(result: &Result<BigDecimal, ComputeError>) {
    let label = match result {
        Ok(_) => "success",
        Err(e) => e.reason.as_str(),
    };
    GATEWAY_REQUESTS.with_label_values(&[label]).inc();
}

/// Feeds responses from the bus into the pending request table.
///
/// One listener runs per process, for the lifetime of the process.
pub struct ResponseListener {
    pending: Arc<PendingRequestStore>,
}

impl ResponseListener {
    pub fn new(pending: Arc<PendingRequestStore>) -> Self {
        Self { pending }
    }

    /// Run the listener loop until the stream ends.
    #[instrument(skip_all, name = "response_listener")]
    pub async fn run<S>(self, events: S)
    where
        S: Stream<Item = CalcEvent> + Send,
    {
        info!("[ResponseListener] Listening for computation responses");

        let mut events = std::pin::pin!(events);
        while let Some(event) = events.next().await {
            match event {
                CalcEvent::ComputationCompleted(response) => {
                    self.handle_response(response);
                }
                other => debug!(kind = other.kind(), "Ignoring non-response event"),
            }
        }

        warn!("[ResponseListener] Response stream ended, stopping listener");
    }

    /// Deliver one response. Returns false if nobody was waiting for it.
    pub fn handle_response(&self, response: ComputationResponse) -> bool {
        let correlation_id = response.correlation_id();
        self.pending.complete(correlation_id, response.into_outcome())
    }
}
