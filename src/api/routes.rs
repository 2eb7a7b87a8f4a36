use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::AppState;
use crate::message::Message;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/metrics/window", get(metrics_window))
        .route("/metrics/mymq/send", post(send))
        .route("/metrics/reset", post(reset))
        .route("/_replicate", post(replicate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "mymq": state.metrics.snapshot(),
        "kafka": state.kafka.snapshot(),
    }))
}

#[derive(Deserialize)]
struct WindowQuery {
    #[serde(rename = "windowMs")]
    window_ms: Option<u64>,
}

async fn metrics_window(State(state): State<AppState>, Query(q): Query<WindowQuery>) -> impl IntoResponse {
    let window_ms = q.window_ms.unwrap_or(60_000);
    Json(json!({
        "mymq": state.metrics.window_snapshot(window_ms),
        "kafka": state.kafka.snapshot(),
    }))
}

#[derive(Deserialize)]
struct SendQuery {
    n: Option<u64>,
    key: Option<String>,
    #[serde(rename = "keyBuckets")]
    key_buckets: Option<u32>,
}

async fn send(State(state): State<AppState>, Query(q): Query<SendQuery>) -> impl IntoResponse {
    let n = q.n.unwrap_or(1);
    let key_buckets = q.key_buckets.unwrap_or(16);
    let mut sent = 0u64;
    for i in 0..n {
        let payload = format!("load-{}", i);
        let ok = state
            .producer
            .publish_bucketed(q.key.clone(), payload, key_buckets)
            .await;
        if ok {
            sent += 1;
        }
    }
    Json(json!({
        "sent": sent,
        "target": n,
        "metrics": state.metrics.snapshot(),
    }))
}

#[derive(Deserialize)]
struct ResetQuery {
    scope: Option<String>,
}

async fn reset(State(state): State<AppState>, Query(q): Query<ResetQuery>) -> impl IntoResponse {
    match q.scope.as_deref() {
        Some("latency") => state.metrics.reset_latency_window(),
        _ => {
            state.metrics.reset_all();
            state.idempotency.clear();
        }
    }
    Json(json!({ "ok": true }))
}

/// Peer-to-peer ingress. Must never trigger outbound replication itself
/// (loop prevention) — it goes straight to `enqueue_from_peer`.
async fn replicate(State(state): State<AppState>, Json(msg): Json<Message>) -> impl IntoResponse {
    let outcome = state.broker.enqueue_from_peer(msg).await;
    if outcome.is_accepted() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    }
}
