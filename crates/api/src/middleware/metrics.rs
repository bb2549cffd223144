//! Prometheus metrics middleware and exporter endpoint.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder. Idempotent; later calls return the
/// handle installed by the first.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("Failed to install Prometheus recorder")
        })
        .clone()
}

/// GET /metrics
pub async fn metrics_handler() -> String {
    init_metrics().render()
}

/// Records request count and latency per route template.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Business metric: a room was created.
pub fn record_room_created(party_room: bool) {
    let kind = if party_room { "party" } else { "script" };
    counter!("rooms_created_total", "kind" => kind).increment(1);
}

/// Business metric: a state transition was accepted.
pub fn record_transition_applied(game_id: &str) {
    counter!("state_transitions_total", "game" => game_id.to_string()).increment(1);
}

/// Business metric: a writer lost the version race.
pub fn record_version_conflict(game_id: &str) {
    counter!("state_version_conflicts_total", "game" => game_id.to_string()).increment(1);
}
