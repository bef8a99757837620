//! HTTP handlers.

use super::dto::{CalculationRequest, CalculationResponse, HealthResponse};
use crate::domain::error::ComputeError;
use crate::service::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use calc_telemetry::{encode_metrics, GATEWAY_REQUESTS};
use tracing::{error, info, warn};

/// `POST /calculate`
pub async fn calculate(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match serde_json::from_slice::<CalculationRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected unparseable request body");
            return rejected(ComputeError::validation("Malformed request body"));
        }
    };

    let calculation = match request.validate() {
        Ok(calculation) => calculation,
        Err(err) => {
            warn!(error = %err, "Rejected invalid calculation request");
            return rejected(err);
        }
    };

    info!(
        operation = %calculation.operation,
        a = %calculation.a,
        b = %calculation.b,
        "Received calculation request"
    );

    match state
        .bridge
        .compute(&calculation.operation, calculation.a, calculation.b)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(CalculationResponse::success(result))).into_response(),
        Err(err) => failure_response(err),
    }
}

/// Validation failure caught before the bridge.
fn rejected(err: ComputeError) -> Response {
    GATEWAY_REQUESTS
        .with_label_values(&[err.reason.as_str()])
        .inc();
    failure_response(err)
}

fn failure_response(err: ComputeError) -> Response {
    (err.status_code(), Json(CalculationResponse::failure(err.message))).into_response()
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        pending: state.bridge.pending().pending_count(),
    })
}

/// `GET /pending`
pub async fn pending_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.bridge.pending().snapshot())
}

/// `GET /metrics`
pub async fn metrics() -> Response {
    match encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
