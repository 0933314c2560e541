//! Live update channel manager with reconnect backoff.
//!
//! One spawned task owns the WebSocket subscription for a board
//! namespace. Decoded events and connection status changes flow to the
//! controller over an mpsc channel; the manager itself never touches the
//! board and never fetches snapshots (the controller decides when a
//! refetch is warranted).

use crate::api_client::WsClient;
use futures_util::{SinkExt, StreamExt};
use serviceflow_api::BoardEvent;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// Connection status as seen by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Connected,
    /// Transiently down; the manager keeps retrying.
    Reconnecting { attempt: u32 },
    /// Connect attempts exhausted; refetch ticks stand in for pushes
    /// until a later connect succeeds.
    Polling,
    /// Handshake rejected (bad credentials); the manager has stopped.
    Failed { message: String },
}

/// Everything the manager can hand to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSignal {
    Event(BoardEvent),
    Status(ChannelStatus),
    /// Fallback-poll tick: the controller should refetch the snapshot.
    RefetchRequested,
}

pub fn spawn_channel_manager(
    ws: WsClient,
    sender: mpsc::Sender<ChannelSignal>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run_channel_manager(ws, sender).await;
    })
}

async fn run_channel_manager(ws: WsClient, sender: mpsc::Sender<ChannelSignal>) {
    let reconnect = ws.reconnect_config().clone();
    let mut backoff = reconnect.initial_ms;
    let mut attempts: u32 = 0;

    loop {
        match ws.connect().await {
            Ok(stream) => {
                attempts = 0;
                backoff = reconnect.initial_ms;
                info!(url = %ws.url(), "update channel connected");
                if sender
                    .send(ChannelSignal::Status(ChannelStatus::Connected))
                    .await
                    .is_err()
                {
                    return;
                }
                pump_connection(stream, ws.heartbeat_interval(), &sender).await;
                info!("update channel closed");
            }
            Err(err) => {
                if err.is_terminal_handshake() {
                    warn!(error = %err, "update channel rejected, giving up");
                    let _ = sender
                        .send(ChannelSignal::Status(ChannelStatus::Failed {
                            message: err.to_string(),
                        }))
                        .await;
                    return;
                }
                debug!(error = %err, "update channel connect failed");
            }
        }

        attempts = attempts.saturating_add(1);
        if attempts == reconnect.max_attempts {
            warn!(
                attempts,
                "max connect attempts reached, falling back to polling"
            );
            if sender
                .send(ChannelSignal::Status(ChannelStatus::Polling))
                .await
                .is_err()
            {
                return;
            }
        }

        if attempts >= reconnect.max_attempts {
            tokio::time::sleep(ws.fallback_poll_interval()).await;
            if sender.send(ChannelSignal::RefetchRequested).await.is_err() {
                return;
            }
        } else {
            if sender
                .send(ChannelSignal::Status(ChannelStatus::Reconnecting {
                    attempt: attempts,
                }))
                .await
                .is_err()
            {
                return;
            }
            let delay = jittered_backoff(backoff, reconnect.jitter_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let next = (backoff as f64 * reconnect.multiplier) as u64;
            backoff = next.min(reconnect.max_ms);
        }
    }
}

/// Read one connection until it drops. Decode failures are logged and
/// skipped; they never tear down the subscription.
async fn pump_connection(
    mut stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    heartbeat_interval: Duration,
    sender: &mpsc::Sender<ChannelSignal>,
) {
    let mut heartbeat = tokio::time::interval(heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if stream
                    .send(Message::Text(r#"{"type":"ping"}"#.to_string()))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<BoardEvent>(&text) {
                            Ok(event) => {
                                debug!(event_type = event.event_type(), "channel event");
                                if sender.send(ChannelSignal::Event(event)).await.is_err() {
                                    return;
                                }
                            }
                            Err(err) => {
                                warn!(error = %err, "dropping undecodable channel payload");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(error = %err, "update channel error");
                        return;
                    }
                }
            }
        }
    }
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    let jitter = nanos % jitter_ms;
    base_ms.saturating_add(jitter)
}
