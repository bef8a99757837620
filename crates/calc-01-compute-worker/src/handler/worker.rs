//! Compute worker loop.
//!
//! Consumes `ComputationRequested` events, evaluates them and publishes one
//! `ComputationCompleted` per request to the response channel. Up to
//! `concurrency` requests are in flight at once, each evaluated on tokio's
//! blocking pool, so responses may leave out of request order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use calc_telemetry::{BUS_MESSAGES_PUBLISHED, WORKER_COMPUTATIONS};
use futures::{Stream, StreamExt};
use shared_bus::{CalcEvent, EventPublisher};
use shared_types::{ComputationRequest, ComputationResponse, FailureReason, INTERNAL_ERROR_MESSAGE};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::WorkerConfig;
use crate::ports::Calculator;

/// Bus-facing half of the worker.
pub struct ComputeWorker<C> {
    calculator: Arc<C>,
    publisher: Arc<dyn EventPublisher>,
    response_channel: String,
    concurrency: usize,
}

impl<C: Calculator + 'static> ComputeWorker<C> {
    pub fn new(calculator: Arc<C>, publisher: Arc<dyn EventPublisher>, config: &WorkerConfig) -> Self {
        Self {
            calculator,
            publisher,
            response_channel: config.response_channel.clone(),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Evaluate one request on the calling thread.
    pub fn evaluate(&self, request: &ComputationRequest) -> ComputationResponse {
        evaluate_with(self.calculator.as_ref(), request)
    }

    /// Evaluate and publish. A failed publish is logged and dropped; the
    /// waiting caller will observe a timeout.
    pub async fn process(&self, request: ComputationRequest) {
        let correlation_id = request.correlation_id;
        let calculator = Arc::clone(&self.calculator);
        let response =
            match tokio::task::spawn_blocking(move || evaluate_with(calculator.as_ref(), &request)).await {
                Ok(response) => response,
                Err(e) => {
                    error!(correlation_id = %correlation_id, error = %e, "Evaluation task failed");
                    ComputationResponse::failure(
                        correlation_id,
                        FailureReason::Internal,
                        INTERNAL_ERROR_MESSAGE,
                    )
                }
            };

        match self
            .publisher
            .publish(&self.response_channel, CalcEvent::ComputationCompleted(response))
            .await
        {
            Ok(receivers) => {
                BUS_MESSAGES_PUBLISHED
                    .with_label_values(&[self.response_channel.as_str()])
                    .inc();
                debug!(correlation_id = %correlation_id, receivers, "Response published");
            }
            Err(e) => {
                warn!(
                    correlation_id = %correlation_id,
                    channel = %self.response_channel,
                    error = %e,
                    "Failed to publish response, dropping"
                );
            }
        }
    }

    /// Consume `events` until the stream ends.
    #[instrument(skip_all, name = "compute_worker")]
    pub async fn run<S>(self, events: S)
    where
        S: Stream<Item = CalcEvent> + Send,
    {
        info!(
            channel = %self.response_channel,
            concurrency = self.concurrency,
            "[ComputeWorker] Listening for computation requests"
        );

        let worker = &self;
        events
            .for_each_concurrent(self.concurrency, move |event| async move {
                match event {
                    CalcEvent::ComputationRequested(request) => worker.process(request).await,
                    other => debug!(kind = other.kind(), "Ignoring non-request event"),
                }
            })
            .await;

        warn!("[ComputeWorker] Request stream ended");
    }
}

/// Evaluate one request. Never fails: every failure becomes a response.
fn evaluate_with<C: Calculator + ?Sized>(calculator: &C, request: &ComputationRequest) -> ComputationResponse {
    let correlation_id = request.correlation_id;

    info!(
        correlation_id = %correlation_id,
        operation = %request.operation,
        a = %request.operand_a,
        b = %request.operand_b,
        "Received calculation request"
    );

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        calculator.calculate(&request.operation, &request.operand_a, &request.operand_b)
    }));

    let response = match outcome {
        Ok(Ok(result)) => {
            info!(
                correlation_id = %correlation_id,
                operation = %request.operation,
                result = %result,
                "Calculation result"
            );
            ComputationResponse::success(correlation_id, result)
        }
        Ok(Err(err)) => match err.reason() {
            FailureReason::Internal => {
                error!(correlation_id = %correlation_id, error = %err, "Unexpected error in calculation");
                ComputationResponse::failure(correlation_id, FailureReason::Internal, INTERNAL_ERROR_MESSAGE)
            }
            reason => {
                warn!(correlation_id = %correlation_id, reason = %reason, error = %err, "Calculation rejected");
                ComputationResponse::failure(correlation_id, reason, err.to_string())
            }
        },
        Err(_) => {
            error!(correlation_id = %correlation_id, "Calculator panicked");
            ComputationResponse::failure(correlation_id, FailureReason::Internal, INTERNAL_ERROR_MESSAGE)
        }
    };

    let label = match response.outcome() {
        Ok(_) => "success",
        Err(failure) => failure.reason.as_str(),
    };
    WORKER_COMPUTATIONS.with_label_values(&[label]).inc();

    response
}
