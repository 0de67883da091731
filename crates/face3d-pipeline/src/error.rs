//! Error types for the frame pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Why a frame submission was rejected without being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The session already has a frame in flight.
    SessionBusy,
    /// Every worker slot is occupied.
    PoolSaturated,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::SessionBusy => write!(f, "session already has a frame in flight"),
            RejectReason::PoolSaturated => write!(f, "worker pool saturated"),
        }
    }
}

/// Errors that can occur while processing a frame.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Frame decode failed: {0}")]
    Decode(String),

    #[error("No face detected")]
    NoFace,

    #[error("Face detection failed: {0}")]
    Detection(String),

    #[error("Mesh inference failed: {0}")]
    Inference(String),

    #[error("Frame dispatch rejected: {0}")]
    DispatchRejected(RejectReason),
}

impl PipelineError {
    /// Create a decode failure error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a detection failure error.
    pub fn detection(message: impl Into<String>) -> Self {
        Self::Detection(message.into())
    }

    /// Create an inference failure error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Whether this failure should be surfaced to the client.
    ///
    /// Dispatch rejections are an expected backpressure outcome and stay
    /// silent; everything else produces an outbound event.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, PipelineError::DispatchRejected(_))
    }
}
