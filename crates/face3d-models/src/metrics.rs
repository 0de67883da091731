//! Performance metrics snapshot.

use serde::{Deserialize, Serialize};

/// A point-in-time view of the sliding-window performance metrics.
///
/// All latency fields are in milliseconds. An empty window reports zeros
/// across the board rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Frames per second, derived from mean inter-arrival time.
    pub fps: f64,
    /// Mean processing latency over the window.
    pub avg_latency_ms: f64,
    /// Minimum processing latency over the window.
    pub min_latency_ms: f64,
    /// Maximum processing latency over the window.
    pub max_latency_ms: f64,
    /// Total frames dropped since startup or the last reset. Counts both
    /// admission-policy skips and detection/inference failures.
    pub dropped_frames: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_zero() {
        let snap = MetricsSnapshot::default();
        assert_eq!(snap.fps, 0.0);
        assert_eq!(snap.avg_latency_ms, 0.0);
        assert_eq!(snap.dropped_frames, 0);
    }

    #[test]
    fn test_serialization_field_names() {
        let snap = MetricsSnapshot {
            fps: 10.0,
            avg_latency_ms: 20.0,
            min_latency_ms: 10.0,
            max_latency_ms: 30.0,
            dropped_frames: 4,
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"fps\":10.0"));
        assert!(json.contains("\"avg_latency_ms\":20.0"));
        assert!(json.contains("\"dropped_frames\":4"));
    }
}
