//! End-to-end tests: gateway, bus and worker wired by `CalcRuntime`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use calc_runtime::{CalcRuntime, RuntimeConfig};
use shared_types::{BigDecimal, FailureReason};
use tower::ServiceExt;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

async fn started(config: RuntimeConfig) -> CalcRuntime {
    let mut runtime = CalcRuntime::new(config).unwrap();
    runtime.start().unwrap();
    runtime
}

#[tokio::test]
async fn test_reference_vectors() {
    let mut runtime = started(RuntimeConfig::default()).await;
    let bridge = runtime.bridge();

    let cases = [
        ("sum", "10.5", "2.5", "13.0"),
        ("subtraction", "10.5", "2.5", "8.0"),
        ("multiplication", "2.55", "2.0", "5.1"),
        ("division", "6.0", "2.0", "3.0000000000"),
        ("division", "0.0", "5.0", "0E-10"),
        ("division", "-6.0", "2.0", "-3.0000000000"),
        ("division", "5.0", "2.0", "2.5000000000"),
        ("division", "-5.0", "-2.0", "2.5000000000"),
    ];

    for (op, a, b, expected) in cases {
        let result = bridge.compute(op, dec(a), dec(b)).await.unwrap();
        assert_eq!(result, dec(expected), "{op}({a}, {b})");
        assert_eq!(
            result.as_bigint_and_exponent().1,
            dec(expected).as_bigint_and_exponent().1,
            "{op}({a}, {b}) scale"
        );
    }

    assert_eq!(runtime.pending().pending_count(), 0);
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_failures_surface_with_reason() {
    let mut runtime = started(RuntimeConfig::default()).await;
    let bridge = runtime.bridge();

    let err = bridge
        .compute("division", dec("10"), dec("0"))
        .await
        .unwrap_err();
    assert_eq!(err.reason, FailureReason::DomainError);
    assert_eq!(err.message, "Division by zero");

    let err = bridge
        .compute("frobnicate", dec("1"), dec("1"))
        .await
        .unwrap_err();
    assert_eq!(err.reason, FailureReason::Unsupported);
    assert_eq!(err.message, "Unsupported operation: frobnicate");

    runtime.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_resolve_to_their_own_results() {
    let mut runtime = started(RuntimeConfig::default()).await;
    let bridge = runtime.bridge();

    let calls: Vec<_> = (0..100i64)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                let op = if i % 2 == 0 { "sum" } else { "multiplication" };
                let result = bridge
                    .compute(op, BigDecimal::from(i), BigDecimal::from(3))
                    .await;
                (i, op, result)
            })
        })
        .collect();

    for call in calls {
        let (i, op, result) = call.await.unwrap();
        let expected = if op == "sum" {
            BigDecimal::from(i + 3)
        } else {
            BigDecimal::from(i * 3)
        };
        assert_eq!(result.unwrap(), expected, "{op}({i}, 3)");
    }

    assert_eq!(runtime.pending().pending_count(), 0);
    let stats = runtime.pending().snapshot();
    assert_eq!(stats.registered, 100);
    assert_eq!(stats.completed, 100);
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_configured_division_scale() {
    let mut config = RuntimeConfig::default();
    config.worker.arithmetic.division.scale = 2;
    let mut runtime = started(config).await;

    let result = runtime
        .bridge()
        .compute("division", dec("2"), dec("3"))
        .await
        .unwrap();

    assert_eq!(result.to_string(), "0.67");
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_timeout_when_worker_is_not_running() {
    let mut config = RuntimeConfig::default();
    config.gateway.request_timeout = Duration::from_millis(100);
    // Never started: nothing consumes requests or delivers responses.
    let runtime = CalcRuntime::new(config).unwrap();

    let err = runtime
        .bridge()
        .compute("sum", dec("1"), dec("1"))
        .await
        .unwrap_err();

    assert_eq!(err.reason, FailureReason::Timeout);
    assert_eq!(err.message, "Request timed out");
    assert_eq!(runtime.pending().pending_count(), 0);
}

#[tokio::test]
async fn test_http_round_trip() {
    let mut runtime = started(RuntimeConfig::default()).await;
    let router = runtime.router();

    let response = router
        .oneshot(
            Request::post("/calculate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"operation":"SUM","a":10.5,"b":"2.5"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "result": "13.0" }));

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_served_over_tcp_until_shutdown() {
    let mut config = RuntimeConfig::default();
    config.gateway.http.host = "127.0.0.1".parse().unwrap();
    config.gateway.http.port = 0;
    let mut runtime = started(config).await;

    let listener = runtime.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    runtime.spawn_http(listener);

    let stream = tokio::net::TcpStream::connect(addr).await;
    assert!(stream.is_ok());
    drop(stream);

    runtime.shutdown().await;
    assert_eq!(runtime.pending().pending_count(), 0);
}
