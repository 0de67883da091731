//! Client for the inference sidecar service.
//!
//! The face detector and the 3D reconstruction model run out of process;
//! this crate talks to them over HTTP and implements the pipeline's
//! collaborator traits so the server can treat both as opaque calls.

pub mod client;
pub mod error;
pub mod types;

pub use client::{InferenceClient, MlClientConfig};
pub use error::{MlError, MlResult};
pub use types::{DetectResponse, ModelInfo};
