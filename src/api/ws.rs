//! WebSocket endpoint for the live-update relay.
//!
//! Clients connect to `GET /ws` and exchange `{ "type": ..., "data": ... }`
//! envelopes. Inbound commands are dispatched to [`RelayHub::handle`];
//! everything the hub queues for the connection is written back as text
//! frames. Malformed frames are logged and dropped.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, warn};

use super::handlers::AppState;
use crate::relay::{ClientMessage, ConnectionId, RelayHub};

/// GET /ws - Upgrade to a relay connection
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(mut socket: WebSocket, relay: RelayHub) {
    let (conn, mut rx) = relay.connect();

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(message) = outbound else {
                    debug!(conn, "Relay dropped connection");
                    break;
                };
                let json = match serde_json::to_string(&message) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!(conn, error = %e, "Failed to serialize relay message");
                        continue;
                    }
                };
                if socket.send(Message::Text(json)).await.is_err() {
                    debug!(conn, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => dispatch(&relay, conn, &text),
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => dispatch(&relay, conn, text),
                        Err(_) => warn!(conn, len = bytes.len(), "Ignoring non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(conn, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(conn, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(conn, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    relay.disconnect(conn);
}

fn dispatch(relay: &RelayHub, conn: ConnectionId, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => relay.handle(conn, message),
        Err(e) => warn!(conn, error = %e, "Ignoring malformed relay frame"),
    }
}
