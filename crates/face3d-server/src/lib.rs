//! Axum WebSocket server for real-time 3D face reconstruction.
//!
//! Exposes the streaming endpoint (`/ws/stream`), status and health routes,
//! and an optional Prometheus metrics endpoint.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ServerConfig;
pub use routes::create_router;
pub use state::AppState;
