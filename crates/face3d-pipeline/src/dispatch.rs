//! Dispatch coordinator: bounded worker pool with single-in-flight
//! sessions.
//!
//! Submissions are rejected rather than queued when the session already has
//! a frame in flight or when every worker slot is taken. Queueing here
//! would amplify latency as soon as inference runs slower than frames
//! arrive; dropping keeps the ingestion path responsive.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use face3d_models::{FaceBox, ServerEvent};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, RejectReason};
use crate::frame::Frame;
use crate::inference::{FaceDetector, MeshPredictor};
use crate::metrics_window::{FrameTimer, MetricsWindow};
use crate::session::SessionContext;

/// Schedules accepted frames onto a bounded worker pool and emits outcomes
/// through the session's event channel.
pub struct DispatchCoordinator {
    config: PipelineConfig,
    pool: Arc<Semaphore>,
    detector: Arc<dyn FaceDetector>,
    predictor: Arc<dyn MeshPredictor>,
    metrics: Arc<MetricsWindow>,
}

impl DispatchCoordinator {
    /// Create a coordinator with `config.worker_count` worker slots.
    pub fn new(
        config: PipelineConfig,
        detector: Arc<dyn FaceDetector>,
        predictor: Arc<dyn MeshPredictor>,
        metrics: Arc<MetricsWindow>,
    ) -> Self {
        let pool = Arc::new(Semaphore::new(config.worker_count.max(1)));
        Self {
            config,
            pool,
            detector,
            predictor,
            metrics,
        }
    }

    /// Shared metrics window.
    pub fn metrics(&self) -> &Arc<MetricsWindow> {
        &self.metrics
    }

    /// Submit an admitted frame for processing.
    ///
    /// Never blocks. Returns `DispatchRejected` when the session already
    /// has a frame in flight or the pool is saturated; the frame is counted
    /// as dropped and the caller is expected to stay silent toward the
    /// client.
    pub fn submit(
        &self,
        session: &Arc<SessionContext>,
        frame: Frame,
        timer: FrameTimer,
    ) -> PipelineResult<()> {
        if !session.try_begin_work() {
            self.metrics.record_end(timer, false);
            return Err(PipelineError::DispatchRejected(RejectReason::SessionBusy));
        }

        let permit = match Arc::clone(&self.pool).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                session.finish_work();
                self.metrics.record_end(timer, false);
                return Err(PipelineError::DispatchRejected(RejectReason::PoolSaturated));
            }
        };

        let config = self.config.clone();
        let detector = Arc::clone(&self.detector);
        let predictor = Arc::clone(&self.predictor);
        let metrics = Arc::clone(&self.metrics);
        let session = Arc::clone(session);

        tokio::spawn(async move {
            let _permit = permit;
            // Release the in-flight slot however the task exits
            let session = scopeguard::guard(session, |s| s.finish_work());
            process_frame(&config, &*detector, &*predictor, &metrics, &session, frame, timer)
                .await;
        });

        Ok(())
    }
}

/// Run one frame through tracking, detection, and reconstruction.
async fn process_frame(
    config: &PipelineConfig,
    detector: &dyn FaceDetector,
    predictor: &dyn MeshPredictor,
    metrics: &MetricsWindow,
    session: &SessionContext,
    frame: Frame,
    timer: FrameTimer,
) {
    let bbox = match resolve_face(config, detector, session, &frame).await {
        Ok(bbox) => bbox,
        Err(err) => {
            metrics.record_end(timer, false);
            let event = match err {
                PipelineError::NoFace => ServerEvent::no_face("No face detected"),
                other => ServerEvent::error(other.to_string()),
            };
            session.emit(event).await;
            return;
        }
    };

    match predictor.predict(&frame, bbox).await {
        Ok(mesh) if mesh.is_valid() => {
            let snapshot = metrics.snapshot();
            session.emit(ServerEvent::mesh_update(mesh, snapshot)).await;
            metrics.record_end(timer, true);
        }
        Ok(_) => {
            warn!(
                session_id = %session.id(),
                seq = frame.seq(),
                model = predictor.name(),
                "model returned mesh with out-of-range face indices"
            );
            metrics.record_end(timer, false);
            session
                .emit(ServerEvent::error("Mesh inference failed: malformed mesh output"))
                .await;
        }
        Err(err) => {
            debug!(session_id = %session.id(), seq = frame.seq(), "inference failed: {err}");
            metrics.record_end(timer, false);
            session.emit(ServerEvent::error(err.to_string())).await;
        }
    }
}

/// Produce a bounding box for the frame, reusing the tracked box when
/// allowed and falling back to full detection otherwise.
///
/// Holds the tracker lock only while choosing the box; inference runs
/// without it.
async fn resolve_face(
    config: &PipelineConfig,
    detector: &dyn FaceDetector,
    session: &SessionContext,
    frame: &Frame,
) -> PipelineResult<FaceBox> {
    let mut tracker = session.tracker().lock().await;

    // Periodic forced refresh: clear state so detection runs again below
    if config.tracking_enabled && tracker.should_redetect(config.redetect_interval) {
        debug!(session_id = %session.id(), "redetect interval elapsed, forcing detection");
        tracker.reset();
    }

    if config.tracking_enabled {
        if let Some(bbox) = tracker.reuse_for(frame.width(), frame.height()) {
            return Ok(bbox);
        }
    }

    match detector.detect_face(frame).await {
        Ok(Some(bbox)) => {
            let bbox = bbox.clamp(frame.width(), frame.height());
            if !bbox.is_valid() {
                tracker.reset();
                return Err(PipelineError::NoFace);
            }
            tracker.observe_detection(bbox);
            Ok(bbox)
        }
        Ok(None) => {
            tracker.reset();
            Err(PipelineError::NoFace)
        }
        Err(err) => {
            warn!(
                session_id = %session.id(),
                detector = detector.name(),
                "detection failed: {err}"
            );
            tracker.reset();
            Err(err)
        }
    }
}
