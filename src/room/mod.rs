//! The single game room.
//!
//! `Room` owns every piece of shared state: the session (position and
//! logs) and the connection registry. Lock order is always session first,
//! registry second, so a broadcast is never interleaved with a join.

mod role;
mod router;
mod state;

pub use role::{Role, RoleSlots, SPECTATOR_LABEL};
pub use router::Outcome;
pub use state::{SessionState, Snapshot, INITIAL_POSITION};

use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tracing::error;

use crate::error::WebSocketError;
use crate::websocket::{ConnectionId, ConnectionRegistry, ServerMessage};

#[derive(Debug, Default)]
pub struct Room {
    session: Mutex<SessionState>,
    registry: ConnectionRegistry,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Registers a connection and queues its role and a full snapshot,
    /// ahead of any broadcast that follows.
    pub async fn join(
        &self,
        outbound: mpsc::Sender<Message>,
    ) -> Result<(ConnectionId, Role), WebSocketError> {
        let session = self.session.lock().await;
        let (id, role) = self.registry.register(outbound).await;

        let greeting = ServerMessage::Color { color: role }.to_text().and_then(|color| {
            let state = ServerMessage::from(session.snapshot()).to_text()?;
            Ok((color, state))
        });
        let (color, state) = match greeting {
            Ok(frames) => frames,
            Err(e) => {
                error!(connection = %id, error = %e, "Failed to encode greeting");
                self.registry.unregister(id).await;
                return Err(e.into());
            }
        };

        self.registry.send_to(id, &color).await?;
        self.registry.send_to(id, &state).await?;
        Ok((id, role))
    }

    pub async fn leave(&self, id: ConnectionId) -> Option<Role> {
        self.registry.unregister(id).await
    }

    pub async fn session(&self) -> SessionState {
        self.session.lock().await.clone()
    }
}
