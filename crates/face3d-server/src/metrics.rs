//! Prometheus metrics for the server.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // WebSocket metrics
    pub const WS_CONNECTIONS_TOTAL: &str = "face3d_ws_connections_total";
    pub const WS_CONNECTIONS_ACTIVE: &str = "face3d_ws_connections_active";
    pub const WS_MESSAGES_SENT: &str = "face3d_ws_messages_sent_total";
    pub const WS_MESSAGES_RECEIVED: &str = "face3d_ws_messages_received_total";

    // Frame metrics
    pub const FRAMES_RECEIVED_TOTAL: &str = "face3d_frames_received_total";
}

/// Record a new WebSocket connection.
pub fn record_ws_connection() {
    counter!(names::WS_CONNECTIONS_TOTAL).increment(1);
}

/// Update active WebSocket connections gauge.
pub fn set_ws_active_connections(count: i64) {
    gauge!(names::WS_CONNECTIONS_ACTIVE).set(count as f64);
}

/// Record an outbound WebSocket event.
pub fn record_ws_message_sent(event: &str) {
    let labels = [("event", event.to_string())];
    counter!(names::WS_MESSAGES_SENT, &labels).increment(1);
}

/// Record an inbound WebSocket message.
pub fn record_ws_message_received(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::WS_MESSAGES_RECEIVED, &labels).increment(1);
}

/// Record an inbound frame payload.
pub fn record_frame_received(encoding: &str) {
    let labels = [("encoding", encoding.to_string())];
    counter!(names::FRAMES_RECEIVED_TOTAL, &labels).increment(1);
}
