//! Request/response types for the inference sidecar API.

use serde::{Deserialize, Serialize};

use face3d_models::MeshData;

/// Face detection request: one JPEG frame, base64-encoded.
#[derive(Debug, Clone, Serialize)]
pub struct DetectRequest {
    pub image: String,
}

/// Face detection response.
///
/// `bbox` is absent when no face was found; `confidence` accompanies a box
/// so the caller can apply its own threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub bbox: Option<[i32; 4]>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// 3D reconstruction request: the full frame plus the face bounding box.
#[derive(Debug, Clone, Serialize)]
pub struct ReconstructRequest {
    pub image: String,
    pub bbox: [i32; 4],
}

/// 3D reconstruction response.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconstructResponse {
    #[serde(flatten)]
    pub mesh: MeshData,
}

/// Sidecar model metadata, surfaced through the status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub input_size: u32,
    #[serde(default)]
    pub loaded: bool,
}

/// Sidecar health response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_response_without_face() {
        let response: DetectResponse = serde_json::from_str("{}").unwrap();
        assert!(response.bbox.is_none());
        assert!(response.confidence.is_none());
    }

    #[test]
    fn test_detect_response_with_face() {
        let response: DetectResponse =
            serde_json::from_str(r#"{"bbox":[10,20,110,140],"confidence":0.97}"#).unwrap();
        assert_eq!(response.bbox, Some([10, 20, 110, 140]));
    }

    #[test]
    fn test_reconstruct_response_flattens_mesh() {
        let response: ReconstructResponse = serde_json::from_str(
            r#"{"vertices":[[0.0,0.0,0.0],[1.0,0.0,0.0],[0.0,1.0,0.0]],"faces":[[0,1,2]]}"#,
        )
        .unwrap();
        assert_eq!(response.mesh.num_vertices(), 3);
        assert_eq!(response.mesh.num_faces(), 1);
    }
}
