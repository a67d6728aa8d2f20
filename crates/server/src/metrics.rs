//! Prometheus exporter for the `metrics` facade

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Install the global recorder
///
/// Returns `None` when a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe();
            Some(handle)
        },
        Err(e) => {
            tracing::warn!(error = %e, "Metrics recorder not installed");
            None
        },
    }
}

fn describe() {
    metrics::describe_counter!("chat_requests_total", "Chat turns by outcome");
    metrics::describe_histogram!("chat_latency_seconds", "Chat turn latency");
    metrics::describe_counter!("completion_cache_hits_total", "Completion cache hits");
    metrics::describe_counter!("completion_cache_misses_total", "Completion cache misses");
    metrics::describe_counter!("tool_calls_total", "Tool invocations by tool and outcome");
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
