//! Worker ↔ bus integration tests.
//!
//! Runs the worker against a live in-memory bus: requests go in on the
//! request channel, responses come back on the response channel.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use calc_01_compute_worker::{CalculatorService, ComputeWorker, WorkerConfig};
use shared_bus::{CalcEvent, ChannelFilter, EventPublisher, InMemoryEventBus};
use shared_types::{BigDecimal, ComputationRequest, CorrelationId, FailureReason};
use tokio::time::timeout;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

async fn start_worker(bus: &Arc<InMemoryEventBus>, config: WorkerConfig) {
    let calculator = Arc::new(CalculatorService::from_config(&config.arithmetic).unwrap());
    let requests = bus
        .subscribe(ChannelFilter::channel(config.request_channel.clone()))
        .into_stream();
    let worker = ComputeWorker::new(calculator, bus.clone(), &config);
    tokio::spawn(worker.run(requests));
}

#[tokio::test]
async fn test_every_request_gets_exactly_one_response() {
    // Arrange
    let bus = Arc::new(InMemoryEventBus::new());
    let mut responses = bus.subscribe(ChannelFilter::channel("calc-responses"));
    start_worker(&bus, WorkerConfig::default()).await;

    let cases = [
        ("sum", "10.5", "2.5", Ok("13.0")),
        ("subtraction", "10.5", "2.5", Ok("8.0")),
        ("MULTIPLICATION", "2.55", "2.0", Ok("5.1")),
        ("division", "5.0", "2.0", Ok("2.5000000000")),
        ("division", "10", "0", Err(FailureReason::DomainError)),
        ("frobnicate", "1", "1", Err(FailureReason::Unsupported)),
    ];

    let mut expected = HashMap::new();
    for (op, a, b, outcome) in cases {
        let id = CorrelationId::new();
        expected.insert(id, outcome);
        let request = ComputationRequest::new(id, op, dec(a), dec(b));

        // Act
        bus.publish("calc-requests", CalcEvent::ComputationRequested(request))
            .await
            .unwrap();
    }

    // Assert
    for _ in 0..expected.len() {
        let event = timeout(Duration::from_secs(1), responses.recv())
            .await
            .expect("worker did not answer")
            .expect("bus closed");
        let CalcEvent::ComputationCompleted(response) = event else {
            panic!("unexpected event on response channel");
        };
        let want = expected
            .remove(&response.correlation_id())
            .expect("response for unknown or already answered id");
        match (want, response.outcome()) {
            (Ok(value), Ok(got)) => assert_eq!(got.to_string(), value),
            (Err(reason), Err(failure)) => assert_eq!(failure.reason, reason),
            (want, got) => panic!("expected {want:?}, got {got:?}"),
        }
    }
    assert!(expected.is_empty());
    assert!(timeout(Duration::from_millis(50), responses.recv()).await.is_err());
}

#[tokio::test]
async fn test_worker_honours_configured_channels_and_scale() {
    let bus = Arc::new(InMemoryEventBus::new());
    let mut config = WorkerConfig {
        request_channel: "alt-requests".into(),
        response_channel: "alt-responses".into(),
        ..WorkerConfig::default()
    };
    config.arithmetic.division.scale = 3;
    let mut responses = bus.subscribe(ChannelFilter::channel("alt-responses"));
    start_worker(&bus, config).await;

    let id = CorrelationId::new();
    // Default channel is not consumed.
    bus.publish(
        "calc-requests",
        CalcEvent::ComputationRequested(ComputationRequest::new(
            CorrelationId::new(),
            "sum",
            dec("1"),
            dec("1"),
        )),
    )
    .await
    .unwrap();
    bus.publish(
        "alt-requests",
        CalcEvent::ComputationRequested(ComputationRequest::new(id, "division", dec("2"), dec("3"))),
    )
    .await
    .unwrap();

    let event = timeout(Duration::from_secs(1), responses.recv())
        .await
        .expect("worker did not answer")
        .expect("bus closed");
    assert_eq!(event.correlation_id(), id);
    let CalcEvent::ComputationCompleted(response) = event else {
        panic!("unexpected event");
    };
    assert_eq!(response.result(), Some(&dec("0.667")));
    assert!(timeout(Duration::from_millis(50), responses.recv()).await.is_err());
}
