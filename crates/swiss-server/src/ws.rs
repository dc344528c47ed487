use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use tokio::sync::mpsc;
use tracing::debug;

use swiss_core::protocol::{ClientMessage, ServerMessage, TournamentView};

use crate::service;
use crate::state::AppState;

/// Inbound messages allowed per connection per second.
const RATE_LIMIT: u32 = 20;

/// Top-level WebSocket handler -- spawned per connection.
pub async fn handle_socket(state: Arc<AppState>, mut socket: WebSocket, code: String) {
    state.connection_count.fetch_add(1, Ordering::Relaxed);

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Initial snapshot goes out before the sender joins the broadcast list.
    let snapshot = state
        .tournaments
        .get(&code)
        .map(|entry| TournamentView::new(&code, &entry.tournament));
    let first = match snapshot {
        Some(tournament) => ServerMessage::Snapshot { tournament },
        None => ServerMessage::Error {
            message: "Tournament not found".into(),
        },
    };
    let _ = tx.send(first);

    state
        .subscribers
        .entry(code.clone())
        .or_default()
        .push(tx.clone());
    debug!(code = %code, "subscriber connected");

    let mut message_count = 0u32;
    let mut rate_limit_window = Instant::now();

    loop {
        tokio::select! {
            // Outbound: forward queued ServerMessage to the WebSocket.
            Some(msg) = rx.recv() => {
                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
            // Inbound: read from the WebSocket.
            maybe_msg = socket.recv() => {
                match maybe_msg {
                    Some(Ok(Message::Text(text))) => {
                        let now = Instant::now();
                        if now.duration_since(rate_limit_window) > Duration::from_secs(1) {
                            rate_limit_window = now;
                            message_count = 0;
                        }
                        message_count += 1;
                        if message_count > RATE_LIMIT {
                            let _ = tx.send(ServerMessage::Error {
                                message: "Rate limited".into(),
                            });
                            continue;
                        }

                        let client_msg: ClientMessage = match serde_json::from_str(&text) {
                            Ok(m) => m,
                            Err(e) => {
                                let _ = tx.send(ServerMessage::Error {
                                    message: format!("Invalid message: {}", e),
                                });
                                continue;
                            }
                        };

                        handle_message(&state, &code, &tx, client_msg).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    _ => continue,
                }
            }
        }
    }

    if let Some(mut subs) = state.subscribers.get_mut(&code) {
        subs.retain(|s| !s.same_channel(&tx));
    }
    state.connection_count.fetch_sub(1, Ordering::Relaxed);
    debug!(code = %code, "subscriber disconnected");
}

async fn handle_message(
    state: &AppState,
    code: &str,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::ReportResult {
            round,
            slot,
            outcome,
        } => {
            // Success is broadcast to every subscriber, this one included.
            if let Err(e) = service::report_result(state, code, round, slot, outcome).await {
                let _ = tx.send(ServerMessage::Error {
                    message: e.to_string(),
                });
            }
        }
        ClientMessage::Ping => {
            let _ = tx.send(ServerMessage::Pong);
        }
    }
}
