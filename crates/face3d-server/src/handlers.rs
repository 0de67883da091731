//! HTTP handlers for status and health checks.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use face3d_ml_client::ModelInfo;
use face3d_models::MetricsSnapshot;

use crate::state::AppState;

/// Status response for the root endpoint.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub model_info: ModelInfo,
    pub config: StatusConfig,
}

#[derive(Serialize)]
pub struct StatusConfig {
    pub device: String,
    pub resolution: u32,
    pub frame_stride: u32,
    pub tracking_enabled: bool,
}

/// Root endpoint: process status plus model metadata.
pub async fn index(State(state): State<AppState>) -> Json<StatusResponse> {
    // The sidecar may be unreachable; status still renders with empty info
    let model_info = state.ml.info().await.unwrap_or_default();

    Json(StatusResponse {
        status: "running".to_string(),
        model_info,
        config: StatusConfig {
            device: state.config.device.clone(),
            resolution: state.config.input_resolution,
            frame_stride: state.pipeline.config().frame_stride,
            tracking_enabled: state.pipeline.config().tracking_enabled,
        },
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub components: ComponentHealth,
    pub metrics: MetricsSnapshot,
}

/// Per-component readiness flags.
#[derive(Serialize)]
pub struct ComponentHealth {
    pub model: bool,
    pub detector: bool,
    pub preprocessor: bool,
    pub performance_logger: bool,
}

/// Detailed health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    // Detector and model share the sidecar process
    let sidecar_up = state.ml.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: if sidecar_up { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        components: ComponentHealth {
            model: sidecar_up,
            detector: sidecar_up,
            preprocessor: true,
            performance_logger: true,
        },
        metrics: state.pipeline.metrics_snapshot(),
    })
}
