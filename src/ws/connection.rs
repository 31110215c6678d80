//! WebSocket connection lifecycle management.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::http::routes::AppState;
use crate::room::RoomManager;
use crate::util::id::ConnId;
use crate::ws::gateway::Client;
use crate::ws::protocol::{ClientEvent, ServerEvent};

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.rooms))
}

async fn handle_socket(socket: WebSocket, rooms: Arc<RoomManager>) {
    let id = ConnId::new();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    info!(conn = %id, "connected");

    // Forward queued events to the socket. Ends once every sender is dropped.
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!(conn = %id, %err, "dropping unserializable event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut client = Client::new(id, tx);
    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    let name = event.name();
                    if let Err(err) = client.handle(&rooms, event) {
                        debug!(conn = %id, event = name, %err, "event discarded");
                    }
                }
                Err(err) => warn!(conn = %id, %err, "malformed frame"),
            },
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    client.disconnect(&rooms);
    drop(client);
    if let Err(err) = writer.await {
        debug!(conn = %id, %err, "writer task ended abnormally");
    }
    info!(conn = %id, "disconnected");
}
