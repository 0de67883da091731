//! Per-client session state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use face3d_models::ServerEvent;

use crate::tracking::FaceTracker;

/// State owned by one connected client.
///
/// Holds the session's face tracker, its frame counter, and the outbound
/// event channel back to the transport. The tracker sits behind an async
/// mutex purely to satisfy shared ownership; the single-in-flight guarantee
/// means it is never actually contended.
pub struct SessionContext {
    id: String,
    frame_counter: AtomicU64,
    in_flight: AtomicBool,
    tracker: Mutex<FaceTracker>,
    events: mpsc::Sender<ServerEvent>,
}

impl SessionContext {
    /// Create a session with a fresh tracker.
    pub fn new(id: impl Into<String>, events: mpsc::Sender<ServerEvent>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            frame_counter: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            tracker: Mutex::new(FaceTracker::new()),
            events,
        })
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Assign the next frame index for this session.
    pub fn next_frame_index(&self) -> u64 {
        self.frame_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// The session's face tracker.
    pub fn tracker(&self) -> &Mutex<FaceTracker> {
        &self.tracker
    }

    /// Try to claim the session's single in-flight slot.
    ///
    /// Returns false when a frame is already being processed.
    pub(crate) fn try_begin_work(&self) -> bool {
        !self.in_flight.swap(true, Ordering::AcqRel)
    }

    /// Release the in-flight slot.
    pub(crate) fn finish_work(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    /// Whether a frame is currently in flight for this session.
    pub fn has_work_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send an event toward the client.
    ///
    /// Returns false when the session is gone (channel closed). The result
    /// is simply discarded, which is how completions of already-disconnected
    /// sessions are handled.
    pub async fn emit(&self, event: ServerEvent) -> bool {
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                // Slow client: fall back to an awaited send for backpressure
                debug!(session_id = %self.id, "outbound event buffer full, applying backpressure");
                self.events.send(event).await.is_ok()
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                debug!(
                    session_id = %self.id,
                    event = event.event_name(),
                    "session gone, dropping event"
                );
                false
            }
        }
    }

    /// Reset face tracking for this session.
    pub async fn reset_tracking(&self) {
        self.tracker.lock().await.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (Arc<SessionContext>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (SessionContext::new("s-1", tx), rx)
    }

    #[tokio::test]
    async fn test_frame_indices_are_sequential() {
        let (session, _rx) = session();
        assert_eq!(session.next_frame_index(), 0);
        assert_eq!(session.next_frame_index(), 1);
        assert_eq!(session.next_frame_index(), 2);
    }

    #[tokio::test]
    async fn test_in_flight_slot_is_exclusive() {
        let (session, _rx) = session();
        assert!(session.try_begin_work());
        assert!(!session.try_begin_work());
        session.finish_work();
        assert!(session.try_begin_work());
    }

    #[tokio::test]
    async fn test_emit_after_disconnect_is_silent() {
        let (session, rx) = session();
        drop(rx);
        assert!(!session.emit(ServerEvent::no_face("gone")).await);
    }

    #[tokio::test]
    async fn test_reset_tracking() {
        let (session, _rx) = session();
        session
            .tracker()
            .lock()
            .await
            .observe_detection(face3d_models::FaceBox::new(0, 0, 10, 10));
        session.reset_tracking().await;
        assert!(!session.tracker().lock().await.is_tracking());
    }
}
