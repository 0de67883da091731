//! API routes.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{health, index};
use crate::state::AppState;
use crate::ws::ws_stream;

/// Create the server router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let status_routes = Router::new()
        .route("/", get(index))
        .route("/health", get(health));

    let ws_routes = Router::new().route("/ws/stream", get(ws_stream));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(status_routes)
        .merge(ws_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_frame_bytes))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// Build the CORS layer from the configured origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}
