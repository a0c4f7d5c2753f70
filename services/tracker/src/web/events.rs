//! services/tracker/src/web/events.rs
//!
//! The `/events` WebSocket. Each connection subscribes to the service's event bus
//! and forwards every `DataEvent` as a JSON text frame until the client goes away
//! or the server shuts down.

use crate::web::{protocol::ServerMessage, state::AppState};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use production_tracker_core::User;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn events_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user.id))
}

async fn send(sender: &mut SplitSink<WebSocket, Message>, message: &ServerMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            true
        }
    }
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user_id: String) {
    info!("Event stream opened for user: {}", user_id);
    // Subscribe before announcing so nothing published in between is lost.
    let mut events = app_state.service.events().subscribe();
    let (mut sender, mut receiver) = socket.split();

    if !send(&mut sender, &ServerMessage::Connected { user_id: user_id.clone() }).await {
        return;
    }

    loop {
        tokio::select! {
            _ = app_state.shutdown.cancelled() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!("Event stream receive error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
            event = events.recv() => {
                let message = match event {
                    Ok(event) => ServerMessage::Event { event },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event stream lagged");
                        ServerMessage::Lagged { skipped }
                    }
                    Err(RecvError::Closed) => break,
                };
                if !send(&mut sender, &message).await {
                    break;
                }
            }
        }
    }

    info!("Event stream closed for user: {}", user_id);
}
