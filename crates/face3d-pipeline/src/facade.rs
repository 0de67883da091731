//! Pipeline façade: the single entry point per inbound frame event.

use std::sync::Arc;

use tracing::debug;

use face3d_models::{MetricsSnapshot, ServerEvent};

use crate::admission::AdmissionPolicy;
use crate::config::PipelineConfig;
use crate::dispatch::DispatchCoordinator;
use crate::frame::{Frame, FramePayload};
use crate::inference::{FaceDetector, MeshPredictor};
use crate::metrics_window::MetricsWindow;
use crate::session::SessionContext;

/// Composes admission, dispatch, and metrics behind one entry point.
///
/// `handle_frame` returns as soon as the frame is admitted or dropped;
/// detection and inference run on the worker pool and outcomes flow back
/// through the session's event channel.
pub struct FramePipeline {
    config: PipelineConfig,
    admission: AdmissionPolicy,
    dispatcher: DispatchCoordinator,
    metrics: Arc<MetricsWindow>,
}

impl FramePipeline {
    /// Build a pipeline around the given collaborators.
    pub fn new(
        config: PipelineConfig,
        detector: Arc<dyn FaceDetector>,
        predictor: Arc<dyn MeshPredictor>,
    ) -> Self {
        let metrics = Arc::new(MetricsWindow::new(
            config.metrics_window_size,
            config.metrics_log_interval,
        ));
        let admission = AdmissionPolicy::new(config.frame_stride);
        let dispatcher =
            DispatchCoordinator::new(config.clone(), detector, predictor, Arc::clone(&metrics));
        Self {
            config,
            admission,
            dispatcher,
            metrics,
        }
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Shared metrics window.
    pub fn metrics(&self) -> &Arc<MetricsWindow> {
        &self.metrics
    }

    /// Process one inbound frame event. Non-blocking: either the frame is
    /// dispatched to the worker pool or it is dropped synchronously.
    pub async fn handle_frame(&self, session: &Arc<SessionContext>, payload: FramePayload) {
        let timer = self.metrics.record_start();
        let index = session.next_frame_index();

        if !self.admission.admits(index) {
            if self.config.count_skipped_frames {
                session.tracker().lock().await.note_skipped();
            }
            self.metrics.record_end(timer, false);
            return;
        }

        let frame = match Frame::decode(index, &payload) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(session_id = %session.id(), frame_index = index, "{err}");
                self.metrics.record_end(timer, false);
                session.emit(ServerEvent::error("Failed to decode frame")).await;
                return;
            }
        };

        if let Err(err) = self.dispatcher.submit(session, frame, timer) {
            // Expected backpressure outcome: already counted as dropped,
            // nothing is sent to the client
            debug!(session_id = %session.id(), frame_index = index, "{err}");
        }
    }

    /// Explicit recalibration: clear the session's tracking state so the
    /// next admitted frame runs full detection.
    pub async fn recalibrate(&self, session: &Arc<SessionContext>) {
        session.reset_tracking().await;
        debug!(session_id = %session.id(), "tracking recalibrated");
    }

    /// Session teardown. In-flight work may still complete; its result is
    /// discarded once the session's event channel closes.
    pub async fn handle_disconnect(&self, session: &Arc<SessionContext>) {
        session.reset_tracking().await;
        debug!(session_id = %session.id(), "session disconnected");
    }

    /// Current metrics snapshot; does not mutate state.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Clear the metrics window and dropped counter.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use face3d_models::{FaceBox, MeshData};

    use crate::error::PipelineResult;

    struct FixedDetector;

    #[async_trait]
    impl FaceDetector for FixedDetector {
        async fn detect_face(&self, _frame: &Frame) -> PipelineResult<Option<FaceBox>> {
            Ok(Some(FaceBox::new(8, 8, 40, 40)))
        }

        fn name(&self) -> &'static str {
            "fixed-detector"
        }
    }

    struct FixedPredictor;

    #[async_trait]
    impl MeshPredictor for FixedPredictor {
        async fn predict(&self, _frame: &Frame, _bbox: FaceBox) -> PipelineResult<MeshData> {
            Ok(MeshData::new(vec![[0.0, 0.0, 0.0]], Vec::new()))
        }

        fn name(&self) -> &'static str {
            "fixed-predictor"
        }
    }

    fn pipeline(config: PipelineConfig) -> FramePipeline {
        FramePipeline::new(config, Arc::new(FixedDetector), Arc::new(FixedPredictor))
    }

    fn session() -> (Arc<SessionContext>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (SessionContext::new("s-1", tx), rx)
    }

    /// Encode a blank 64x48 PNG in memory.
    fn png_payload() -> FramePayload {
        let img = image::RgbImage::new(64, 48);
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        FramePayload::Binary(bytes)
    }

    #[tokio::test]
    async fn test_stride_skips_are_counted_as_dropped() {
        let config = PipelineConfig {
            frame_stride: 3,
            ..PipelineConfig::default()
        };
        let pipeline = pipeline(config);
        let (session, mut rx) = session();

        for _ in 0..6 {
            pipeline
                .handle_frame(&session, png_payload())
                .await;
            // Wait out the in-flight frame so sequential submissions never
            // collide with the single-in-flight guard
            while session.has_work_in_flight() {
                tokio::task::yield_now().await;
            }
        }

        // Indices 0 and 3 admitted, four skipped
        let mut mesh_updates = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, ServerEvent::MeshUpdate { .. }) {
                mesh_updates += 1;
            }
        }
        assert_eq!(mesh_updates, 2);
        assert_eq!(pipeline.metrics_snapshot().dropped_frames, 4);
    }

    #[tokio::test]
    async fn test_malformed_payload_emits_error() {
        let pipeline = pipeline(PipelineConfig {
            frame_stride: 1,
            ..PipelineConfig::default()
        });
        let (session, mut rx) = session();

        pipeline
            .handle_frame(&session, FramePayload::Base64("!!!".into()))
            .await;

        assert!(matches!(rx.recv().await.unwrap(), ServerEvent::Error { .. }));
        assert_eq!(pipeline.metrics_snapshot().dropped_frames, 1);
    }

    #[tokio::test]
    async fn test_skipped_frames_advance_redetect_counter_when_configured() {
        let config = PipelineConfig {
            frame_stride: 2,
            count_skipped_frames: true,
            ..PipelineConfig::default()
        };
        let pipeline = pipeline(config);
        let (session, mut rx) = session();

        // Frame 0 admitted: detection stores a box
        pipeline
            .handle_frame(&session, png_payload())
            .await;
        rx.recv().await.unwrap();

        // Frame 1 skipped by the stride, but still ages the track
        pipeline
            .handle_frame(&session, png_payload())
            .await;

        assert_eq!(session.tracker().lock().await.frames_since_detection(), 1);
    }

    #[tokio::test]
    async fn test_recalibrate_resets_tracking() {
        let pipeline = pipeline(PipelineConfig {
            frame_stride: 1,
            ..PipelineConfig::default()
        });
        let (session, mut rx) = session();

        pipeline
            .handle_frame(&session, png_payload())
            .await;
        rx.recv().await.unwrap();
        assert!(session.tracker().lock().await.is_tracking());

        pipeline.recalibrate(&session).await;
        assert!(!session.tracker().lock().await.is_tracking());
    }
}
