//! WebSocket streaming endpoint.
//!
//! One socket per client session. Inbound messages are either tagged JSON
//! events or raw binary frames; outbound events flow through a bounded
//! channel so a slow client applies backpressure to the send side without
//! ever stalling frame ingestion.

use std::sync::atomic::{AtomicI64, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use face3d_models::{ClientEvent, ServerEvent};
use face3d_pipeline::{FramePayload, SessionContext};

use crate::metrics;
use crate::state::AppState;

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// Outbound event buffer per session.
const WS_SEND_BUFFER_SIZE: usize = 32;

/// WebSocket streaming endpoint.
pub async fn ws_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Track connection
    let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_ws_active_connections(count);
    metrics::record_ws_connection();

    ws.max_message_size(state.config.max_frame_bytes)
        .on_upgrade(|socket| async move {
            handle_stream_socket(socket, state).await;
            // Decrement on disconnect
            let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::set_ws_active_connections(count);
        })
}

/// Handle one streaming connection for its whole lifetime.
async fn handle_stream_socket(socket: WebSocket, state: AppState) {
    let (ws_sender, mut receiver) = socket.split();

    // Bounded channel between pipeline workers and the socket
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(WS_SEND_BUFFER_SIZE);
    let session = SessionContext::new(Uuid::new_v4().to_string(), tx);

    info!(session_id = %session.id(), "client connected");

    // Dedicated send task: serializes events and owns the sink half
    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(event) = rx.recv().await {
            metrics::record_ws_message_sent(event.event_name());
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!("failed to serialize outbound event: {e}");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Greeting with the configured device and input resolution
    session
        .emit(ServerEvent::connected(
            state.config.device.clone(),
            state.config.input_resolution,
        ))
        .await;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                metrics::record_ws_message_received("text");
                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(ClientEvent::Frame { image }) => {
                        metrics::record_frame_received("base64");
                        state
                            .pipeline
                            .handle_frame(&session, FramePayload::Base64(image))
                            .await;
                    }
                    Ok(ClientEvent::GetMetrics) => {
                        session
                            .emit(ServerEvent::metrics_update(state.pipeline.metrics_snapshot()))
                            .await;
                    }
                    Ok(ClientEvent::ResetMetrics) => {
                        state.pipeline.reset_metrics();
                        session.emit(ServerEvent::metrics_reset()).await;
                    }
                    Ok(ClientEvent::Recalibrate) => {
                        state.pipeline.recalibrate(&session).await;
                        session.emit(ServerEvent::recalibrated()).await;
                    }
                    Err(e) => {
                        debug!(session_id = %session.id(), "unparseable message: {e}");
                        session
                            .emit(ServerEvent::error(format!("Invalid message: {e}")))
                            .await;
                    }
                }
            }
            Ok(Message::Binary(bytes)) => {
                metrics::record_ws_message_received("binary");
                metrics::record_frame_received("binary");
                state
                    .pipeline
                    .handle_frame(&session, FramePayload::Binary(bytes))
                    .await;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) | Err(_) => break,
        }
    }

    state.pipeline.handle_disconnect(&session).await;
    info!(session_id = %session.id(), "client disconnected");

    // Any in-flight worker still holds a session clone; the send task winds
    // down once the last clone (and its channel sender) is gone
    drop(session);
    let _ = send_task.await;
}
