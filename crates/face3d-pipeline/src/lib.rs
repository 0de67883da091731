//! Real-time frame pipeline for 3D face reconstruction.
//!
//! The pipeline turns a stream of webcam frames into a stream of
//! reconstructed meshes while keeping latency bounded under CPU-bound
//! inference:
//!
//! - [`admission`] gates frames by stride before any work happens
//! - [`tracking`] reuses the last face location to skip detection
//! - [`dispatch`] runs accepted frames on a bounded worker pool with at
//!   most one in-flight frame per session
//! - [`metrics_window`] aggregates per-frame timing over a sliding window
//! - [`facade`] ties the pieces together behind one entry point
//!
//! Detection and reconstruction are external collaborators behind the
//! [`inference`] traits.

pub mod admission;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod facade;
pub mod frame;
pub mod inference;
pub mod metrics_window;
pub mod session;
pub mod tracking;

// Re-export common types
pub use admission::AdmissionPolicy;
pub use config::PipelineConfig;
pub use dispatch::DispatchCoordinator;
pub use error::{PipelineError, PipelineResult, RejectReason};
pub use facade::FramePipeline;
pub use frame::{Frame, FramePayload};
pub use inference::{FaceDetector, MeshPredictor};
pub use metrics_window::{FrameTimer, MetricsWindow};
pub use session::SessionContext;
pub use tracking::FaceTracker;
