use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::Notification;
use crate::middleware::auth::AuthUser;

/// Pushes the caller's new notifications as JSON text frames.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    auth: AuthUser,
) -> impl IntoResponse {
    let rx = state.ws_tx.subscribe();
    let user_id = auth.id();
    ws.on_upgrade(move |socket| handle_socket(socket, rx, user_id))
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<Notification>, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    debug!(%user_id, "notification socket opened");

    let mut send_task = tokio::spawn(async move {
        loop {
            let notification = match rx.recv().await {
                Ok(notification) => notification,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%user_id, skipped, "notification socket lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if notification.user_id != user_id {
                continue;
            }
            let payload = match serde_json::to_string(&notification) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "failed to encode notification");
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound frames are ignored; the loop only watches for the close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    debug!(%user_id, "notification socket closed");
}
