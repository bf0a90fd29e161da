use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use sharepost_types::events::PlatformEvent;

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Whether `event` should be written to a connection owned by `user_id`.
pub fn delivers_to(event: &PlatformEvent, user_id: &str) -> bool {
    event.target_user().is_none_or(|target| target == user_id)
}

/// Handle a WebSocket whose user was identified at the HTTP upgrade.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, user_id: String) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before Hello so nothing published after it is missed
    let mut broadcast_rx = dispatcher.subscribe();

    let hello = PlatformEvent::Hello {
        user_id: user_id.clone(),
    };
    match serde_json::to_string(&hello) {
        Ok(text) => {
            if sender.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
        Err(e) => {
            warn!("Failed to encode hello for {}: {}", user_id, e);
            return;
        }
    }

    info!("{} connected to gateway", user_id);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received;

    let send_user = user_id.clone();
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = broadcast_rx.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(RecvError::Lagged(n)) => {
                            warn!("Broadcast receiver for {} lagged by {} events", send_user, n);
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    if !delivers_to(&event, &send_user) {
                        continue;
                    }

                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode event for {}: {}", send_user, e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // The gateway is push-only; inbound frames only matter for liveness.
    let recv_user = user_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                Message::Text(text) => {
                    debug!("{} sent {} bytes of text, ignored", recv_user, text.len());
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("{} disconnected from gateway", user_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharepost_types::models::Post;

    #[test]
    fn test_targeted_events_reach_only_their_user() {
        let ephemeral = PlatformEvent::Ephemeral {
            user_id: "u1".into(),
            post: Post::default(),
        };
        assert!(delivers_to(&ephemeral, "u1"));
        assert!(!delivers_to(&ephemeral, "u2"));

        let posted = PlatformEvent::Posted {
            post: Post::default(),
        };
        assert!(delivers_to(&posted, "u2"));
    }
}
