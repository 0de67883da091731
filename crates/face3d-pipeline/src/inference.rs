//! Collaborator traits for the external detector and reconstruction model.
//!
//! The pipeline never runs detection or inference itself; it calls these
//! seams. Production wires them to the inference sidecar, tests use
//! in-process fakes.

use async_trait::async_trait;

use face3d_models::{FaceBox, MeshData};

use crate::error::PipelineResult;
use crate::frame::Frame;

/// Face bounding-box detector.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Detect the most prominent face in the frame.
    ///
    /// Returns `Ok(None)` when no face meets the confidence threshold.
    /// That is a benign, expected outcome, distinct from a detector
    /// invocation error.
    async fn detect_face(&self, frame: &Frame) -> PipelineResult<Option<FaceBox>>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// 3D face reconstruction model.
#[async_trait]
pub trait MeshPredictor: Send + Sync {
    /// Run reconstruction on the face region of the frame.
    async fn predict(&self, frame: &Frame, bbox: FaceBox) -> PipelineResult<MeshData>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}
