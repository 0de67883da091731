//! Application state.

use std::sync::Arc;

use face3d_ml_client::{InferenceClient, MlClientConfig};
use face3d_pipeline::{FaceDetector, FramePipeline, MeshPredictor, PipelineConfig};

use crate::config::ServerConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: Arc<FramePipeline>,
    pub ml: Arc<InferenceClient>,
}

impl AppState {
    /// Create new application state.
    ///
    /// The inference client backs both collaborator seams of the pipeline:
    /// detection and reconstruction live in the same sidecar process.
    pub fn new(
        config: ServerConfig,
        pipeline_config: PipelineConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let ml_config =
            MlClientConfig::from_env().with_min_confidence(pipeline_config.min_confidence);
        let ml = Arc::new(InferenceClient::new(ml_config)?);
        let detector: Arc<dyn FaceDetector> = Arc::clone(&ml) as Arc<dyn FaceDetector>;
        let predictor: Arc<dyn MeshPredictor> = Arc::clone(&ml) as Arc<dyn MeshPredictor>;
        let pipeline = Arc::new(FramePipeline::new(
            pipeline_config,
            detector,
            predictor,
        ));

        Ok(Self {
            config,
            pipeline,
            ml,
        })
    }
}
