//! Pipeline configuration.

/// Configuration for the frame pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Admission stride: frame index `i` is processed iff `i % stride == 0`.
    /// A stride of 1 admits every frame.
    pub frame_stride: u32,
    /// Reuse the last detected bounding box instead of re-detecting on
    /// every frame.
    pub tracking_enabled: bool,
    /// Force full re-detection after this many tracked frames.
    pub redetect_interval: u32,
    /// Number of worker slots for concurrent frame processing.
    pub worker_count: usize,
    /// Number of samples retained by the metrics window.
    pub metrics_window_size: usize,
    /// Emit a performance log line every N successful frames.
    pub metrics_log_interval: u64,
    /// Minimum detection confidence accepted from the face detector.
    pub min_confidence: f32,
    /// Whether admission-policy skips advance the redetect counter.
    pub count_skipped_frames: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_stride: 2,
            tracking_enabled: true,
            redetect_interval: 30,
            worker_count: 2,
            metrics_window_size: 30,
            metrics_log_interval: 30,
            min_confidence: 0.9,
            count_skipped_frames: false,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            frame_stride: std::env::var("PIPELINE_FRAME_STRIDE")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|s: u32| s.max(1))
                .unwrap_or(defaults.frame_stride),
            tracking_enabled: env_bool("PIPELINE_TRACKING_ENABLED", defaults.tracking_enabled),
            redetect_interval: std::env::var("PIPELINE_REDETECT_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.redetect_interval),
            worker_count: std::env::var("PIPELINE_WORKER_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|n: usize| n.max(1))
                .unwrap_or(defaults.worker_count),
            metrics_window_size: std::env::var("PIPELINE_METRICS_WINDOW")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|n: usize| n.max(1))
                .unwrap_or(defaults.metrics_window_size),
            metrics_log_interval: std::env::var("PIPELINE_METRICS_LOG_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|n: u64| n.max(1))
                .unwrap_or(defaults.metrics_log_interval),
            min_confidence: std::env::var("PIPELINE_MIN_CONFIDENCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_confidence),
            count_skipped_frames: env_bool(
                "PIPELINE_COUNT_SKIPPED_FRAMES",
                defaults.count_skipped_frames,
            ),
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
