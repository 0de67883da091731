//! Server configuration.

/// WebSocket server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max inbound WebSocket message size (caps frame payloads)
    pub max_frame_bytes: usize,
    /// Inference device reported to clients
    pub device: String,
    /// Model input resolution reported to clients
    pub input_resolution: u32,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_frame_bytes: 10 * 1024 * 1024, // 10MB
            device: "cpu".to_string(),
            input_resolution: 256,
            environment: "development".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_frame_bytes: std::env::var("MAX_FRAME_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_frame_bytes),
            device: std::env::var("MODEL_DEVICE").unwrap_or(defaults.device),
            input_resolution: std::env::var("MODEL_INPUT_RESOLUTION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.input_resolution),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
