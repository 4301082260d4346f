use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{error, info, warn};

use crate::config::RelayConfig;
use crate::error::WebSocketError;
use crate::room::Room;
use crate::websocket::{Connection, KeepaliveConfig};

/// Accepts relay connections and runs each one on its own tasks.
pub struct WebSocketServer {
    room: Arc<Room>,
    path: String,
    keepalive: KeepaliveConfig,
    outbound_capacity: usize,
}

impl WebSocketServer {
    pub fn new(room: Arc<Room>, config: &RelayConfig) -> Self {
        Self {
            room,
            path: config.path.clone(),
            keepalive: config.keepalive(),
            outbound_capacity: config.outbound_capacity,
        }
    }

    pub fn with_keepalive(mut self, keepalive: KeepaliveConfig) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn room(&self) -> Arc<Room> {
        self.room.clone()
    }

    /// Accept loop. Never returns; a failed accept is logged and skipped.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        server.handle_connection(stream, addr).await;
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept relay connection");
                }
            }
        }
    }

    /// Upgrades the socket, answering 404 for any path but the relay path.
    async fn handshake(&self, raw_stream: TcpStream) -> Result<WebSocketStream<TcpStream>, WebSocketError> {
        let path = self.path.clone();
        let check_path = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            if req.uri().path() == path {
                Ok(resp)
            } else {
                let mut not_found = ErrorResponse::new(Some("Not Found".to_string()));
                *not_found.status_mut() = StatusCode::NOT_FOUND;
                Err(not_found)
            }
        };

        accept_hdr_async(raw_stream, check_path)
            .await
            .map_err(|e| WebSocketError::Handshake(e.to_string()))
    }

    pub async fn handle_connection(self: Arc<Self>, raw_stream: TcpStream, addr: SocketAddr) {
        info!(%addr, "New WebSocket connection");

        let ws_stream = match self.handshake(raw_stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!(%addr, error = %e, "Rejected relay connection");
                return;
            }
        };

        let (ws_sink, ws_stream) = ws_stream.split();
        let (tx, rx) = mpsc::channel(self.outbound_capacity);

        let (connection_id, role) = match self.room.join(tx).await {
            Ok(joined) => joined,
            Err(e) => {
                warn!(%addr, error = %e, "Failed to greet new connection");
                return;
            }
        };
        info!(%addr, connection = %connection_id, role = %role, "Connection joined the room");

        let connection = Connection::new(connection_id, self.room.clone(), self.keepalive);
        let mut send_task = tokio::spawn(connection.clone().write_loop(ws_sink, rx));
        let mut receive_task = tokio::spawn(connection.read_loop(ws_stream));

        // Whichever half stops first takes the other down with it
        tokio::select! {
            result = &mut send_task => {
                receive_task.abort();
                if let Ok(Err(e)) = result {
                    warn!(connection = %connection_id, error = %e, "Send task failed");
                }
            }
            result = &mut receive_task => {
                send_task.abort();
                if let Ok(Err(e)) = result {
                    warn!(connection = %connection_id, error = %e, "Receive task failed");
                }
            }
        }

        self.room.leave(connection_id).await;
        info!(%addr, connection = %connection_id, "Connection closed");
    }
}
