use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use layerforge_events::PipelineEvent;
use tokio::sync::broadcast;

use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// Each connection gets its own event-bus subscription; every
/// [`PipelineEvent`] is forwarded as one JSON text frame. Inbound frames
/// other than `Close` are ignored.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let events = state.event_bus.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, events))
}

/// Split the socket, forward bus events on a spawned sender task and
/// drain inbound frames on this one until either side closes.
async fn handle_socket(socket: WebSocket, mut events: broadcast::Receiver<PipelineEvent>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize pipeline event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(conn_id = %sender_conn_id, skipped = n, "WebSocket client lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let recv_conn_id = conn_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(conn_id = %recv_conn_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
