//! Inference sidecar HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use reqwest::Client;
use tracing::{debug, warn};

use face3d_models::{FaceBox, MeshData};
use face3d_pipeline::{FaceDetector, Frame, MeshPredictor, PipelineError, PipelineResult};

use crate::error::{MlError, MlResult};
use crate::types::{
    DetectRequest, DetectResponse, HealthResponse, ModelInfo, ReconstructRequest,
    ReconstructResponse,
};

/// JPEG quality used when shipping frames to the sidecar.
const JPEG_QUALITY: u8 = 85;

/// Configuration for the inference client.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of the inference service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// Minimum detection confidence accepted from the detector
    pub min_confidence: f32,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 1,
            min_confidence: 0.9,
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("ML_SERVICE_URL")
                .unwrap_or_else(|_| defaults.base_url.clone()),
            timeout: Duration::from_secs(
                std::env::var("ML_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            max_retries: std::env::var("ML_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            min_confidence: defaults.min_confidence,
        }
    }

    /// Set the detection confidence threshold.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}

/// Client for the inference sidecar.
pub struct InferenceClient {
    http: Client,
    config: MlClientConfig,
}

impl InferenceClient {
    /// Create a new inference client.
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    /// Check if the sidecar is healthy.
    pub async fn health_check(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("inference service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("inference service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Fetch model metadata for the status endpoint.
    pub async fn info(&self) -> MlResult<ModelInfo> {
        let url = format!("{}/info", self.config.base_url);
        let response = self.http.get(&url).send().await.map_err(MlError::Network)?;
        if !response.status().is_success() {
            return Err(MlError::RequestFailed(format!(
                "inference service returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// Run face detection on a frame.
    pub async fn detect(&self, frame: &Frame) -> MlResult<Option<(FaceBox, f32)>> {
        let request = DetectRequest {
            image: self.encode_frame(frame)?,
        };
        let url = format!("{}/detect", self.config.base_url);
        let response: DetectResponse = self.post_json(&url, &request).await?;

        let Some([x1, y1, x2, y2]) = response.bbox else {
            return Ok(None);
        };
        let confidence = response.confidence.unwrap_or(1.0);
        if confidence < self.config.min_confidence {
            debug!(
                confidence,
                threshold = self.config.min_confidence,
                "detection below confidence threshold"
            );
            return Ok(None);
        }
        Ok(Some((FaceBox::new(x1, y1, x2, y2), confidence)))
    }

    /// Run 3D reconstruction for the face region of a frame.
    pub async fn reconstruct(&self, frame: &Frame, bbox: FaceBox) -> MlResult<MeshData> {
        let request = ReconstructRequest {
            image: self.encode_frame(frame)?,
            bbox: [bbox.x1, bbox.y1, bbox.x2, bbox.y2],
        };
        let url = format!("{}/reconstruct", self.config.base_url);
        let response: ReconstructResponse = self.post_json(&url, &request).await?;
        Ok(response.mesh)
    }

    /// JPEG-encode a frame and wrap it in base64 for the JSON payload.
    fn encode_frame(&self, frame: &Frame) -> MlResult<String> {
        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
        encoder
            .encode(
                frame.data(),
                frame.width(),
                frame.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| MlError::Encode(e.to_string()))?;
        Ok(BASE64.encode(jpeg))
    }

    async fn post_json<Req, Resp>(&self, url: &str, request: &Req) -> MlResult<Resp>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let response = self
            .with_retry(|| async {
                self.http
                    .post(url)
                    .json(request)
                    .send()
                    .await
                    .map_err(MlError::Network)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::RequestFailed(format!(
                "inference service returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MlError::InvalidResponse(e.to_string()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(100 * 2u64.pow(attempt));
                    warn!(
                        "inference request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(MlError::RequestFailed("Unknown error".to_string())))
    }
}

#[async_trait]
impl FaceDetector for InferenceClient {
    async fn detect_face(&self, frame: &Frame) -> PipelineResult<Option<FaceBox>> {
        match self.detect(frame).await {
            Ok(Some((bbox, _confidence))) => Ok(Some(bbox)),
            Ok(None) => Ok(None),
            Err(e) => Err(PipelineError::detection(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "sidecar-detector"
    }
}

#[async_trait]
impl MeshPredictor for InferenceClient {
    async fn predict(&self, frame: &Frame, bbox: FaceBox) -> PipelineResult<MeshData> {
        self.reconstruct(frame, bbox)
            .await
            .map_err(|e| PipelineError::inference(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "sidecar-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_frame() -> Frame {
        Frame::from_rgb(0, 64, 48, vec![0u8; 64 * 48 * 3]).unwrap()
    }

    fn client_for(server: &MockServer) -> InferenceClient {
        InferenceClient::new(MlClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(2),
            max_retries: 0,
            min_confidence: 0.9,
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = MlClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_detect_returns_confident_box() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "bbox": [10, 20, 110, 140],
                "confidence": 0.97
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let detection = client.detect(&test_frame()).await.unwrap();
        let (bbox, confidence) = detection.unwrap();
        assert_eq!(bbox, FaceBox::new(10, 20, 110, 140));
        assert!((confidence - 0.97).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_detect_filters_low_confidence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "bbox": [10, 20, 110, 140],
                "confidence": 0.42
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.detect(&test_frame()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_detect_no_face() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.detect(&test_frame()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_detection_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.detect_face(&test_frame()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Detection(_)));
    }

    #[tokio::test]
    async fn test_reconstruct_returns_mesh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reconstruct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "vertices": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                "faces": [[0, 1, 2]]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mesh = client
            .reconstruct(&test_frame(), FaceBox::new(0, 0, 32, 32))
            .await
            .unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert!(mesh.is_valid());
    }

    #[tokio::test]
    async fn test_health_check_down_service() {
        let client = InferenceClient::new(MlClientConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_millis(200),
            max_retries: 0,
            min_confidence: 0.9,
        })
        .unwrap();
        assert!(!client.health_check().await.unwrap());
    }
}
