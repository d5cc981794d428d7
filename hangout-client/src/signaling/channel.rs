use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use hangout_core::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{ChannelClosed, ConnectError};
use crate::signaling::{DisconnectReason, SignalingEvent, SignalingOutput};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    pub liveness_timeout: Option<Duration>,
}

impl From<&ClientConfig> for HeartbeatConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            interval: config.heartbeat_interval,
            liveness_timeout: config.liveness_timeout,
        }
    }
}

/// Cloneable sender side of an open signaling connection.
#[derive(Clone)]
pub struct ChannelHandle {
    tx: mpsc::UnboundedSender<Message>,
}

pub struct SignalingChannel;

impl SignalingChannel {
    /// Opens the WebSocket with the join parameters in the query string and
    /// starts the reader, writer and heartbeat. Inbound events arrive on the
    /// returned receiver in transport order.
    pub async fn connect(
        config: &ClientConfig,
    ) -> Result<(ChannelHandle, mpsc::Receiver<SignalingEvent>), ConnectError> {
        let url = config.join.to_url(&config.endpoint)?;
        info!(
            "Connecting to signaling server {}{}",
            url.host_str().unwrap_or_default(),
            url.path()
        );

        let (ws_stream, _) = connect_async(url.as_str()).await?;
        info!("Signaling connection open");

        Ok(Self::start(
            ws_stream,
            HeartbeatConfig::from(config),
            config.event_channel_capacity,
        ))
    }

    fn start(
        ws_stream: WsStream,
        heartbeat: HeartbeatConfig,
        capacity: usize,
    ) -> (ChannelHandle, mpsc::Receiver<SignalingEvent>) {
        let (write, read) = ws_stream.split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(capacity.max(1));

        let mut send_task = tokio::spawn(Self::writer_task(write, out_rx));
        let mut recv_task = tokio::spawn(Self::reader_task(
            read,
            out_tx.clone(),
            event_tx.clone(),
            heartbeat,
        ));

        tokio::spawn(async move {
            let reason = tokio::select! {
                res = (&mut send_task) => {
                    recv_task.abort();
                    res.unwrap_or_else(|e| DisconnectReason::Transport(e.to_string()))
                }
                res = (&mut recv_task) => {
                    send_task.abort();
                    res.unwrap_or_else(|e| DisconnectReason::Transport(e.to_string()))
                }
            };
            info!("Signaling connection closed: {}", reason);
            let _ = event_tx.send(SignalingEvent::Disconnected(reason)).await;
        });

        (ChannelHandle { tx: out_tx }, event_rx)
    }

    async fn writer_task(
        mut write: SplitSink<WsStream, Message>,
        mut rx: mpsc::UnboundedReceiver<Message>,
    ) -> DisconnectReason {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if let Err(e) = write.send(msg).await {
                error!("Failed to send WebSocket message: {}", e);
                return DisconnectReason::Transport(e.to_string());
            }
            if closing {
                return DisconnectReason::ClosedLocally;
            }
        }
        debug!("Writer task terminated");
        DisconnectReason::ClosedLocally
    }

    async fn reader_task(
        mut read: SplitStream<WsStream>,
        out_tx: mpsc::UnboundedSender<Message>,
        event_tx: mpsc::Sender<SignalingEvent>,
        heartbeat: HeartbeatConfig,
    ) -> DisconnectReason {
        let mut ticker = tokio::time::interval_at(
            Instant::now() + heartbeat.interval,
            heartbeat.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                frame = read.next() => {
                    let Some(frame) = frame else {
                        return DisconnectReason::ClosedByServer;
                    };
                    last_seen = Instant::now();

                    match frame {
                        Ok(Message::Text(text)) => {
                            let msg = match serde_json::from_str::<ServerMessage>(&text) {
                                Ok(msg) => msg,
                                Err(e) => {
                                    warn!("Ignoring malformed server message: {}", e);
                                    continue;
                                }
                            };
                            if matches!(msg, ServerMessage::Pong) {
                                debug!("Pong");
                                continue;
                            }
                            if event_tx.send(SignalingEvent::Message(msg)).await.is_err() {
                                debug!("Event receiver dropped, stopping reader");
                                return DisconnectReason::ClosedLocally;
                            }
                        }
                        Ok(Message::Close(_)) => return DisconnectReason::ClosedByServer,
                        Ok(_) => {}
                        Err(e) => {
                            error!("WebSocket error: {}", e);
                            return DisconnectReason::Transport(e.to_string());
                        }
                    }
                }

                _ = ticker.tick() => {
                    if let Some(timeout) = heartbeat.liveness_timeout {
                        if last_seen.elapsed() >= timeout {
                            warn!("No traffic from server for {:?}, closing", last_seen.elapsed());
                            let _ = out_tx.send(Message::Close(None));
                            return DisconnectReason::HeartbeatTimeout;
                        }
                    }
                    if let Some(ping) = encode(&ClientMessage::Ping) {
                        if out_tx.send(ping).is_err() {
                            return DisconnectReason::ClosedLocally;
                        }
                    }
                }
            }
        }
    }
}

fn encode(message: &ClientMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            error!("Failed to serialize client message: {}", e);
            None
        }
    }
}

#[async_trait]
impl SignalingOutput for ChannelHandle {
    async fn send(&self, message: ClientMessage) -> Result<(), ChannelClosed> {
        let Some(frame) = encode(&message) else {
            return Ok(());
        };
        self.tx.send(frame).map_err(|_| ChannelClosed)
    }

    async fn close(&self) {
        let _ = self.tx.send(Message::Close(None));
    }
}
