//! WebSocket endpoint.
//!
//! Realtime features are not built yet; `/ws` completes the upgrade and
//! echoes text and binary frames so clients can test connectivity.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};

/// `GET /ws`
pub async fn ws_handler(upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(echo)
}

async fn echo(mut socket: WebSocket) {
    while let Some(frame) = socket.recv().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket receive failed");
                break;
            }
        };

        let reply = match message {
            Message::Text(_) | Message::Binary(_) => message,
            Message::Close(_) => break,
            // Pings are answered by axum.
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        if socket.send(reply).await.is_err() {
            break;
        }
    }
    tracing::debug!("WebSocket closed");
}
