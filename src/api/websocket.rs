//! WebSocket feed of the printer state snapshot

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::watch;

use super::ApiState;

/// Build state feed routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/state", get(ws_upgrade))
        .with_state(state)
}

async fn ws_upgrade(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let updates = state.state_updates.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, updates))
}

/// Forward every published state message until either side closes
async fn handle_socket(socket: WebSocket, mut updates: watch::Receiver<Arc<str>>) {
    let (mut sender, mut receiver) = socket.split();
    tracing::debug!("state feed client connected");

    let current = Arc::clone(&updates.borrow_and_update());
    if sender.send(Message::Text(current.as_ref().into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    tracing::debug!("state broadcaster stopped");
                    break;
                }
                let message = Arc::clone(&updates.borrow_and_update());
                if sender.send(Message::Text(message.as_ref().into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(bytes = text.len(), "ignoring client message on state feed");
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!("state feed client disconnected");
}
