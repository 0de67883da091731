//! Face tracking state machine.
//!
//! Holds the last-known face location between frames so the dispatch
//! coordinator can skip full detection while the face is assumed
//! stationary. Reuse is literal: the stored box is returned unchanged,
//! gated only on staleness and frame bounds. No detector or model
//! computation happens here.

use face3d_models::FaceBox;

/// Two-state tracker: empty, or tracking a stored bounding box.
#[derive(Debug, Default)]
pub struct FaceTracker {
    last_bbox: Option<FaceBox>,
    active: bool,
    frames_since_detection: u32,
}

impl FaceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the tracker currently holds a reusable box.
    pub fn is_tracking(&self) -> bool {
        self.active && self.last_bbox.is_some()
    }

    /// Tracked frames since the last full detection.
    pub fn frames_since_detection(&self) -> u32 {
        self.frames_since_detection
    }

    /// Record a successful detection, entering the tracking state.
    pub fn observe_detection(&mut self, bbox: FaceBox) {
        self.last_bbox = Some(bbox);
        self.active = true;
        self.frames_since_detection = 0;
    }

    /// Try to reuse the stored box for a frame of the given dimensions.
    ///
    /// Returns the box unchanged and advances the staleness counter. If the
    /// stored box no longer fits inside the frame the tracker resets and
    /// the caller must fall back to full detection.
    pub fn reuse_for(&mut self, frame_width: u32, frame_height: u32) -> Option<FaceBox> {
        if !self.active {
            return None;
        }
        let bbox = self.last_bbox?;
        if !bbox.fits_within(frame_width, frame_height) {
            self.reset();
            return None;
        }
        self.frames_since_detection += 1;
        Some(bbox)
    }

    /// Whether the coordinator should force a full re-detection.
    ///
    /// This is a policy hook: returning true does not change state. The
    /// caller invokes [`reset`](Self::reset) before the next detection call.
    pub fn should_redetect(&self, interval_frames: u32) -> bool {
        self.frames_since_detection >= interval_frames
    }

    /// Advance the staleness counter for a frame that was skipped by the
    /// admission policy. No-op while not tracking.
    pub fn note_skipped(&mut self) {
        if self.active {
            self.frames_since_detection += 1;
        }
    }

    /// Clear all tracking state. Safe to call from any state; idempotent.
    pub fn reset(&mut self) {
        self.last_bbox = None;
        self.active = false;
        self.frames_since_detection = 0;
    }
}
