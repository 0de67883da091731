//! WebSocket message types.
//!
//! Inbound and outbound events are tagged JSON envelopes; the event
//! vocabulary matches what the browser client speaks.

use serde::{Deserialize, Serialize};

use crate::mesh::MeshData;
use crate::metrics::MetricsSnapshot;

/// Messages the client sends to the server.
///
/// Frames may also arrive as raw binary WebSocket messages carrying encoded
/// image bytes; those bypass JSON entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A webcam frame, base64-encoded (optionally with a data-URL prefix).
    Frame { image: String },
    /// Request the current metrics snapshot.
    GetMetrics,
    /// Clear the metrics window and dropped-frame counter.
    ResetMetrics,
    /// Reset face tracking so the next frame runs full detection.
    Recalibrate,
}

/// Messages the server sends to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Session greeting with the configured inference device and input
    /// resolution.
    Connected { device: String, resolution: u32 },

    /// No face was found in the submitted frame.
    NoFace { message: String },

    /// Decode, detection, or inference failed.
    Error { message: String },

    /// A reconstructed mesh for the latest processed frame.
    MeshUpdate {
        #[serde(flatten)]
        mesh: MeshData,
        num_vertices: usize,
        num_faces: usize,
        metrics: MetricsSnapshot,
        face_detected: bool,
    },

    /// Response to a metrics query.
    MetricsUpdate {
        #[serde(flatten)]
        snapshot: MetricsSnapshot,
    },

    /// Confirmation that metrics were cleared.
    MetricsReset { message: String },

    /// Confirmation that face tracking was reset.
    Recalibrated { message: String },
}

impl ServerEvent {
    /// Create a connected greeting.
    pub fn connected(device: impl Into<String>, resolution: u32) -> Self {
        ServerEvent::Connected {
            device: device.into(),
            resolution,
        }
    }

    /// Create a no-face event.
    pub fn no_face(message: impl Into<String>) -> Self {
        ServerEvent::NoFace {
            message: message.into(),
        }
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    /// Create a mesh update carrying the current metrics snapshot.
    pub fn mesh_update(mesh: MeshData, metrics: MetricsSnapshot) -> Self {
        let num_vertices = mesh.num_vertices();
        let num_faces = mesh.num_faces();
        ServerEvent::MeshUpdate {
            mesh,
            num_vertices,
            num_faces,
            metrics,
            face_detected: true,
        }
    }

    /// Create a metrics query response.
    pub fn metrics_update(snapshot: MetricsSnapshot) -> Self {
        ServerEvent::MetricsUpdate { snapshot }
    }

    /// Create a metrics-reset confirmation.
    pub fn metrics_reset() -> Self {
        ServerEvent::MetricsReset {
            message: "Metrics reset successfully".to_string(),
        }
    }

    /// Create a recalibration confirmation.
    pub fn recalibrated() -> Self {
        ServerEvent::Recalibrated {
            message: "Face tracking reset".to_string(),
        }
    }

    /// Event name for logging and metric labels.
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::NoFace { .. } => "no_face",
            ServerEvent::Error { .. } => "error",
            ServerEvent::MeshUpdate { .. } => "mesh_update",
            ServerEvent::MetricsUpdate { .. } => "metrics_update",
            ServerEvent::MetricsReset { .. } => "metrics_reset",
            ServerEvent::Recalibrated { .. } => "recalibrated",
        }
    }
}
