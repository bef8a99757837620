//! Prometheus metrics.
//!
//! All metrics live in one process-wide registry and are exposed by the
//! gateway's `/metrics` endpoint.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // GATEWAY
    // =========================================================================

    /// Completed gateway calls by outcome
    pub static ref GATEWAY_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("calc_gateway_requests_total", "Gateway computations by outcome"),
        &["outcome"]  // outcome: success/validation/unsupported/domain_error/timeout/internal
    ).expect("metric creation failed");

    /// Calls currently waiting for a response
    pub static ref GATEWAY_PENDING_REQUESTS: Gauge = Gauge::new(
        "calc_gateway_pending_requests",
        "Entries currently held in the pending-request table"
    ).expect("metric creation failed");

    /// Time from publishing a request to its terminal outcome
    pub static ref GATEWAY_REQUEST_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "calc_gateway_request_duration_seconds",
            "Round trip through the bus for one computation"
        ).buckets(exponential_buckets(0.0005, 2.0, 15).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Responses that arrived for an unknown or already retired correlation id
    pub static ref GATEWAY_STALE_RESPONSES: Counter = Counter::new(
        "calc_gateway_stale_responses_total",
        "Responses discarded because no call was waiting for them"
    ).expect("metric creation failed");

    // =========================================================================
    // WORKER
    // =========================================================================

    /// Requests processed by the worker, by outcome
    pub static ref WORKER_COMPUTATIONS: CounterVec = CounterVec::new(
        Opts::new("calc_worker_computations_total", "Worker computations by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    // =========================================================================
    // BUS
    // =========================================================================

    /// Messages published, by channel
    pub static ref BUS_MESSAGES_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("calc_bus_messages_published_total", "Messages published to the bus"),
        &["channel"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(GATEWAY_REQUESTS.clone()),
        Box::new(GATEWAY_PENDING_REQUESTS.clone()),
        Box::new(GATEWAY_REQUEST_DURATION.clone()),
        Box::new(GATEWAY_STALE_RESPONSES.clone()),
        Box::new(WORKER_COMPUTATIONS.clone()),
        Box::new(BUS_MESSAGES_PUBLISHED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice_is_ok() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_encoded_output_contains_counters() {
        register_metrics().unwrap();
        WORKER_COMPUTATIONS.with_label_values(&["success"]).inc();

        let text = encode_metrics().unwrap();

        assert!(text.contains("calc_worker_computations_total"));
    }

    #[test]
    fn test_histogram_timer_observes_on_drop() {
        let before = GATEWAY_REQUEST_DURATION.get_sample_count();
        {
            let _timer = HistogramTimer::new(&GATEWAY_REQUEST_DURATION);
        }
        assert!(GATEWAY_REQUEST_DURATION.get_sample_count() > before);
    }
}
