//! WebSocket broadcast endpoint
//!
//! Every text frame a client sends is relayed to all connected clients,
//! the sender included.

use std::sync::Arc;

use agora_services::ConnectionManager;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};

use crate::state::AppState;

/// GET /v1/ws
async fn ws_handler(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    let manager = Arc::clone(&state.ws);
    ws.on_upgrade(move |socket| run_socket(socket, manager))
}

async fn run_socket(socket: WebSocket, manager: Arc<ConnectionManager>) {
    let (mut sink, mut stream) = socket.split();
    let (client_id, mut outbound) = manager.connect().await;

    let forward = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                manager.broadcast(text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(client_id = %client_id, error = %e, "websocket receive failed");
                break;
            }
        }
    }

    manager.disconnect(client_id).await;
    forward.abort();
}

/// WebSocket routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/ws", get(ws_handler))
}
