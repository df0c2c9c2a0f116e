use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::realtime::{ClientMessage, ServerEvent};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Auth token is accepted and recorded; verification lives with the
    // identity service, not here.
    let authenticated = query.token.is_some();
    ws.on_upgrade(move |socket| handle_socket(socket, state, authenticated))
}

/// One task per connection owns the joined-room set, so join/leave from
/// thousands of concurrent connections contend on nothing shared. Events
/// arrive on the process-wide broadcast channel and are forwarded only for
/// rooms this connection joined.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, authenticated: bool) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.room_events_tx.subscribe();
    let mut rooms: HashSet<String> = HashSet::new();

    info!(authenticated, "realtime client connected");

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Join { room }) => {
                                debug!(%room, "client joined room");
                                rooms.insert(room.clone());
                                let ack = ServerEvent::RoomJoined { room };
                                if send_event(&mut sender, &ack).await.is_err() {
                                    break;
                                }
                            }
                            Ok(ClientMessage::Leave { room }) => {
                                debug!(%room, "client left room");
                                rooms.remove(&room);
                            }
                            Err(err) => {
                                warn!(error = %err, "unparseable realtime frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            event = events.recv() => {
                match event {
                    Ok(envelope) => {
                        if rooms.contains(&envelope.room)
                            && send_event(&mut sender, &envelope.event).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Best-effort delivery: a slow client just misses
                        // the oldest events.
                        warn!(skipped, "realtime client lagged; events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!("realtime client disconnected");
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "failed to serialize realtime event");
            return Ok(());
        }
    };

    sender.send(Message::Text(json)).await
}
