//! Web server module for the spyglass exporter.
//!
//! Exposes the scrape endpoint and the exporter's own liveness probe.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::collector::UpstreamCollector;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<UpstreamCollector>,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Error type for scrape endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response()
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(app_state)
}

/// Scrape endpoint.
///
/// Collection runs fresh within the request and cannot fail; a
/// text-encoding problem is the only error path.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<Response, MetricsError> {
    let families = state.collector.collect().await;

    let encoder = TextEncoder::new();
    let mut buffer = Vec::with_capacity(4096);
    if let Err(error) = encoder.encode(&families, &mut buffer) {
        tracing::error!(error = %error, "failed to encode metric families");
        return Err(MetricsError::EncodingFailed);
    }

    Ok((
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response())
}

/// Liveness probe for the exporter itself.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::UpstreamConfig;
    use axum::body::to_bytes;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        // Nothing listens on this port; scrapes must still succeed.
        let upstream = UpstreamConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(1),
        };
        let collector = UpstreamCollector::new("test_ns", upstream).unwrap();

        AppState {
            collector: Arc::new(collector),
        }
    }

    #[tokio::test]
    async fn test_healthz_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_succeeds_with_upstream_down() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/plain"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8_lossy(&bytes);
        assert!(body.contains("test_ns_health 0"));
        assert!(body.contains("test_ns_cpu_load{bucket=\"1m\"} 0"));
        assert!(body.contains("test_ns_memory_bytes_total 0"));
        assert!(body.contains("test_ns_memory_bytes_used 0"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/unknown")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
