//! # Webhook Relay HTTP Handlers
//!
//! The thin I/O glue around the bounded signal buffer:
//!
//! - `POST /webhook` — normalizes an incoming alert body into a
//!   `SignalRecord` and pushes it into the buffer.
//! - `GET /signals?limit=N` — drains up to N records for the downstream bot.
//!   The drain is destructive: a signal is delivered to exactly one poll.
//! - `GET /health` — liveness plus the advisory buffer size.
//!
//! All boundary errors are caught here and turned into structured JSON
//! responses; the core never sees invalid input (a negative limit is rejected
//! before the buffer is touched, since the value originates from
//! attacker-controllable query input).

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use lib_common::SignalRecord;

use crate::webhook_logic::state::AppState;

/// Default number of signals returned by `GET /signals`.
const DEFAULT_SIGNALS_LIMIT: i64 = 10;

/// # Application Error
///
/// Boundary-layer failures, each mapped to an HTTP status and a JSON
/// `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum AppError {
    /// The webhook body was missing, empty, or a no-content JSON value.
    #[error("No data received")]
    NoData,

    /// The `limit` query parameter was negative. Signaled rather than
    /// clamped: a negative count reaching the core would be a contract
    /// violation.
    #[error("limit must be non-negative, got {0}")]
    NegativeLimit(i64),

    /// Unexpected internal failure while building a response.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    /// Converts an `AppError` into a response with the appropriate HTTP
    /// status code and JSON error body.
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NoData | AppError::NegativeLimit(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/signals", get(signals_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// # Webhook Ingest Handler
///
/// Receives a signal delivery from the upstream alerting source.
///
/// The body is taken as raw bytes and normalized in a best-effort cascade:
/// a JSON object is ingested as-is; any other valid JSON value, or a body
/// that is not valid JSON at all, is wrapped as
/// `{"message": <body>, "raw": true}` so format ambiguity never drops sender
/// data. An empty body (or an empty / null JSON value) is the only rejection.
///
/// The record is pushed into the buffer and, when configured, mirrored to the
/// persistence backend. A mirror failure is logged and the sender still gets
/// a success response: the signal is safely in memory, and the sender's short
/// response-time window must not be spent on storage retries.
pub async fn webhook_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    if body.is_empty() {
        return Err(AppError::NoData);
    }

    let record = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Null) => return Err(AppError::NoData),
        Ok(Value::Object(map)) if map.is_empty() => return Err(AppError::NoData),
        Ok(value) => SignalRecord::from_payload(value),
        Err(e) => {
            debug!("Webhook body is not JSON ({}); storing as raw text", e);
            SignalRecord::from_raw_text(String::from_utf8_lossy(&body).into_owned())
        }
    };
    let timestamp = record.timestamp.clone();

    state.buffer.push(record.clone());
    info!("Signal received and buffered ({} queued)", state.buffer.len());

    if let Some(mirror) = &state.mirror {
        if let Err(e) = mirror.push(&record) {
            // Soft-fail: the buffer already holds the signal.
            warn!("Signal mirror write failed (signal kept in memory): {}", e);
        }
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Signal received and stored",
        "timestamp": timestamp,
    })))
}

/// Query parameters accepted by `GET /signals`.
#[derive(Debug, Deserialize)]
pub struct SignalsQuery {
    /// Maximum number of signals to drain. Defaults to 10.
    pub limit: Option<i64>,
}

/// # Signals Retrieval Handler
///
/// Drains up to `limit` signals, most recent first, for the downstream
/// consumer. The returned records are removed from the buffer atomically;
/// polling twice never delivers the same signal twice.
pub async fn signals_handler(
    State(state): State<AppState>,
    Query(query): Query<SignalsQuery>,
) -> Result<Json<Value>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_SIGNALS_LIMIT);
    if limit < 0 {
        return Err(AppError::NegativeLimit(limit));
    }

    let signals = state.buffer.take_front(limit as usize);
    debug!("Drained {} signal(s), {} remaining", signals.len(), state.buffer.len());

    let signals =
        serde_json::to_value(&signals).map_err(|e| AppError::Internal(e.to_string()))?;
    let count = signals.as_array().map(Vec::len).unwrap_or(0);

    Ok(Json(json!({
        "status": "success",
        "count": count,
        "signals": signals,
    })))
}

/// # Health Check Handler
///
/// Always 200: the relay has no external dependency that could make it
/// unhealthy. Reports the advisory buffer size for monitoring.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "signals_count": state.buffer.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_state() -> AppState {
        AppState::new(100)
    }

    async fn post_webhook(state: &AppState, body: &str) -> Result<Json<Value>, AppError> {
        webhook_handler(State(state.clone()), Bytes::from(body.to_string())).await
    }

    async fn drain(state: &AppState, limit: i64) -> Value {
        let Json(body) = signals_handler(
            State(state.clone()),
            Query(SignalsQuery { limit: Some(limit) }),
        )
        .await
        .unwrap();
        body
    }

    #[tokio::test]
    async fn webhook_stores_signal_and_reports_success() {
        let state = fresh_state();

        let Json(body) = post_webhook(&state, r#"{"action":"BUY","symbol":"BTCUSDT"}"#)
            .await
            .unwrap();

        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Signal received and stored");
        assert!(body["timestamp"].is_string());
        assert_eq!(state.buffer.len(), 1);
    }

    #[tokio::test]
    async fn empty_body_is_rejected_with_no_data() {
        let state = fresh_state();
        let err = post_webhook(&state, "").await.unwrap_err();
        assert!(matches!(err, AppError::NoData));
        assert_eq!(state.buffer.len(), 0);
    }

    #[tokio::test]
    async fn null_and_empty_object_bodies_are_rejected() {
        let state = fresh_state();
        assert!(matches!(post_webhook(&state, "null").await.unwrap_err(), AppError::NoData));
        assert!(matches!(post_webhook(&state, "{}").await.unwrap_err(), AppError::NoData));
    }

    #[tokio::test]
    async fn non_json_body_is_wrapped_as_raw_text() {
        let state = fresh_state();
        post_webhook(&state, "ALERT: gold crossed 2000").await.unwrap();

        let body = drain(&state, 1).await;
        assert_eq!(body["signals"][0]["message"], "ALERT: gold crossed 2000");
        assert_eq!(body["signals"][0]["raw"], true);
    }

    #[tokio::test]
    async fn negative_limit_is_rejected_before_the_buffer_is_touched() {
        let state = fresh_state();
        post_webhook(&state, r#"{"a":1}"#).await.unwrap();

        let err = signals_handler(
            State(state.clone()),
            Query(SignalsQuery { limit: Some(-3) }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NegativeLimit(-3)));
        assert_eq!(state.buffer.len(), 1);
    }

    #[tokio::test]
    async fn limit_defaults_to_ten() {
        let state = fresh_state();
        for i in 0..15 {
            post_webhook(&state, &format!(r#"{{"seq":{}}}"#, i)).await.unwrap();
        }

        let Json(body) = signals_handler(
            State(state.clone()),
            Query(SignalsQuery { limit: None }),
        )
        .await
        .unwrap();

        assert_eq!(body["count"], 10);
        assert_eq!(state.buffer.len(), 5);
    }

    #[tokio::test]
    async fn drain_is_destructive_and_ordered() {
        let state = fresh_state();
        for symbol in ["AAA", "BBB", "CCC"] {
            post_webhook(&state, &format!(r#"{{"symbol":"{}"}}"#, symbol))
                .await
                .unwrap();
        }

        let body = drain(&state, 3).await;
        assert_eq!(body["count"], 3);
        assert_eq!(body["signals"][0]["symbol"], "CCC");
        assert_eq!(body["signals"][2]["symbol"], "AAA");

        // Second poll returns nothing: exactly-once delivery.
        let body = drain(&state, 3).await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn health_reports_buffer_size() {
        let state = fresh_state();
        post_webhook(&state, r#"{"a":1}"#).await.unwrap();

        let Json(body) = health_handler(State(state.clone())).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["signals_count"], 1);
    }

    #[tokio::test]
    async fn end_to_end_over_http() {
        let app = build_router(fresh_state());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::new();
        let base = format!("http://{}", addr);

        // Ingest the canonical trading signal.
        let resp = client
            .post(format!("{}/webhook", base))
            .json(&json!({"action": "BUY", "symbol": "BTCUSDT", "price": 45000}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "success");

        // Drain it: both injected fields must be populated.
        let body: Value = client
            .get(format!("{}/signals?limit=1", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["count"], 1);
        let signal = &body["signals"][0];
        assert_eq!(signal["action"], "BUY");
        assert_eq!(signal["symbol"], "BTCUSDT");
        assert_eq!(signal["price"], 45000);
        assert!(signal["timestamp"].is_string());
        assert!(signal["received_at"].is_string());

        // Second poll is empty: the drain removed the record.
        let body: Value = client
            .get(format!("{}/signals?limit=1", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["count"], 0);
        assert_eq!(body["signals"], json!([]));

        // Negative limits are rejected at the boundary.
        let resp = client
            .get(format!("{}/signals?limit=-1", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());

        // Health is always 200.
        let body: Value = client
            .get(format!("{}/health", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["signals_count"], 0);
    }
}
