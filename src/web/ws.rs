//! The push surface: WebSocket subscriptions at `/ws/{code}`.
//!
//! A socket is read-only from the client's perspective: the server never
//! trusts a socket frame to advance state. Incoming frames are drained
//! and ignored until the client closes.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};

use crate::server::actor::RoomHandle;
use crate::server::hub::Subscription;

use super::AppState;

pub(super) async fn ws_handler(
    State(app): State<AppState>,
    Path(code): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    match app.registry.lookup(&code) {
        Ok(room) => ws.on_upgrade(move |socket| handle_socket(socket, room)),
        Err(err) => err.into_response(),
    }
}

async fn handle_socket(socket: WebSocket, room: RoomHandle) {
    let Ok(subscription) = room.subscribe().await else {
        return;
    };
    let Subscription { id, mut receiver } = subscription;
    tracing::debug!(room_code = %room.code(), subscriber_id = id, "push stream opened");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            frame = receiver.recv() => match frame {
                Some(frame) => {
                    if sink.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                // Dropped by the hub (slow) or the room shut down.
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Clients cannot advance state over the socket.
                Some(Ok(_)) => {}
            },
        }
    }

    room.unsubscribe(id).await;
    tracing::debug!(room_code = %room.code(), subscriber_id = id, "push stream closed");
}
