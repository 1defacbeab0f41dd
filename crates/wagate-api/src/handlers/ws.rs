//! Push WebSocket handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// GET /ws (WebSocket upgrade)
///
/// Clients bind to a tenant by sending `{"token": "..."}` and then receive
/// `{"target":"message","args":[record]}` frames.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let push = state.push().clone();
    let (handle, mut outbound_rx) = push.on_connect();
    let conn_id = handle.id;

    // Spawn outbound frame forwarder
    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Process inbound frames
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Some(token) =
                    push.handle_inbound(conn_id, text.as_str(), |token| state.registry.exists(token))
                {
                    info!(conn_id = %conn_id, token = %token, "Push connection bound");
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Cleanup
    outbound_task.abort();
    push.on_disconnect(&conn_id);
    debug!(conn_id = %conn_id, "WebSocket connection closed");
}
