use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval_at, timeout, timeout_at, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::WebSocketError;
use crate::room::{Outcome, Room};
use crate::websocket::keepalive::{Keepalive, KeepaliveConfig, Liveness};
use crate::websocket::ConnectionId;

/// One registered peer. Cloned into the read task and the write task.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    room: Arc<Room>,
    keepalive: Arc<Mutex<Keepalive>>,
    config: KeepaliveConfig,
}

impl Connection {
    pub fn new(id: ConnectionId, room: Arc<Room>, config: KeepaliveConfig) -> Self {
        Self {
            id,
            room,
            keepalive: Arc::new(Mutex::new(Keepalive::new(&config, Instant::now()))),
            config,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub async fn liveness(&self) -> Liveness {
        self.keepalive.lock().await.state()
    }

    /// Drains the outbound queue and sends a ping every `ping_period`.
    /// Every frame must be written within `write_wait`.
    ///
    /// Returns `Ok` once the registry drops the queue.
    pub async fn write_loop<S>(self, mut sink: S, mut rx: mpsc::Receiver<Message>) -> Result<(), WebSocketError>
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
    {
        let period = self.config.ping_period;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                frame = rx.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = self.write(&mut sink, frame).await {
                            warn!(connection = %self.id, error = %e, "Error sending WebSocket message");
                            break Err(e);
                        }
                    }
                    None => break Ok(()),
                },
                _ = ticker.tick() => {
                    self.keepalive.lock().await.probe_sent();
                    debug!(connection = %self.id, "Sending ping");
                    if let Err(e) = self.write(&mut sink, Message::Ping(Vec::new())).await {
                        warn!(connection = %self.id, error = %e, "Ping failed");
                        break Err(e);
                    }
                }
            }
        };

        if result.is_err() {
            self.keepalive.lock().await.mark_dead();
        }
        if let Ok(Err(e)) = timeout(self.config.write_wait, sink.close()).await {
            debug!(connection = %self.id, error = %e, "Error closing WebSocket connection");
        }
        result
    }

    async fn write<S>(&self, sink: &mut S, frame: Message) -> Result<(), WebSocketError>
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
    {
        match timeout(self.config.write_wait, sink.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(WebSocketError::SendError(e.to_string())),
            Err(_) => Err(WebSocketError::Timeout("write deadline exceeded".into())),
        }
    }

    /// Reads frames until the peer closes, errors, or misses the read
    /// deadline. Any frame from the peer pushes the deadline out by
    /// `pong_wait`.
    pub async fn read_loop<S, E>(self, mut stream: S) -> Result<(), WebSocketError>
    where
        S: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        loop {
            let deadline = self.keepalive.lock().await.read_deadline();
            let frame = match timeout_at(deadline, stream.next()).await {
                Ok(Some(Ok(frame))) => frame,
                Ok(Some(Err(e))) => {
                    self.keepalive.lock().await.mark_dead();
                    return Err(WebSocketError::ReceiveError(e.to_string()));
                }
                Ok(None) => return Ok(()),
                Err(_) => {
                    self.keepalive.lock().await.mark_dead();
                    warn!(connection = %self.id, "Read deadline exceeded, peer presumed dead");
                    return Err(WebSocketError::Timeout("read deadline exceeded".into()));
                }
            };

            self.keepalive.lock().await.heard_from_peer(Instant::now());

            match frame {
                Message::Text(text) => match self.room.dispatch(self.id, &text).await {
                    Ok(Outcome::Detached) => return Err(WebSocketError::Closed),
                    Ok(_) => {}
                    Err(e) if !e.is_fatal() => {
                        warn!(connection = %self.id, error = %e, "Skipping malformed message");
                    }
                    Err(e) => return Err(e),
                },
                Message::Binary(bin) => {
                    debug!(connection = %self.id, len = bin.len(), "Ignoring binary frame");
                }
                Message::Close(reason) => {
                    info!(connection = %self.id, ?reason, "Client initiated close");
                    return Ok(());
                }
                // pings are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }
}
