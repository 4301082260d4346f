use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::error::WebSocketError;
use crate::room::{Role, RoleSlots};

/// Registry key, handed out in join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug)]
struct ClientEntry {
    role: Role,
    outbound: mpsc::Sender<Message>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    slots: RoleSlots,
    clients: BTreeMap<ConnectionId, ClientEntry>,
    next_id: u64,
}

impl RegistryInner {
    fn remove(&mut self, id: ConnectionId) -> Option<Role> {
        let entry = self.clients.remove(&id)?;
        self.slots.release(entry.role);
        Some(entry.role)
    }
}

/// Live connections, their roles, and the seat occupancy, behind one lock.
///
/// Each entry owns the sending side of the connection's bounded outbound
/// queue. Dropping the entry closes the queue, which ends the connection's
/// write half.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, outbound: mpsc::Sender<Message>) -> (ConnectionId, Role) {
        let mut inner = self.inner.lock().await;
        let id = ConnectionId(inner.next_id);
        inner.next_id += 1;
        let role = inner.slots.assign();
        inner.clients.insert(id, ClientEntry { role, outbound });
        info!(connection = %id, role = %role, total = inner.clients.len(), "Registered connection");
        (id, role)
    }

    /// Idempotent. Returns the freed role if the connection was still registered.
    pub async fn unregister(&self, id: ConnectionId) -> Option<Role> {
        let mut inner = self.inner.lock().await;
        let removed = inner.remove(id);
        if let Some(role) = removed {
            info!(connection = %id, role = %role, total = inner.clients.len(), "Unregistered connection");
        }
        removed
    }

    pub async fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.inner.lock().await.clients.get(&id).map(|entry| entry.role)
    }

    /// Live connections in join order.
    pub async fn snapshot(&self) -> Vec<(ConnectionId, Role)> {
        self.inner
            .lock()
            .await
            .clients
            .iter()
            .map(|(id, entry)| (*id, entry.role))
            .collect()
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.lock().await.clients.len()
    }

    pub async fn is_occupied(&self, role: Role) -> bool {
        self.inner.lock().await.slots.is_occupied(role)
    }

    /// Queues a frame for one connection. A full or closed queue
    /// unregisters the connection.
    pub async fn send_to(&self, id: ConnectionId, text: &str) -> Result<(), WebSocketError> {
        let mut inner = self.inner.lock().await;
        let entry = inner.clients.get(&id).ok_or(WebSocketError::Closed)?;
        match entry.outbound.try_send(Message::Text(text.to_string())) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(connection = %id, error = %e, "Dropping connection with unusable outbound queue");
                inner.remove(id);
                Err(WebSocketError::SendError(e.to_string()))
            }
        }
    }

    /// Queues a frame for every live connection. Connections whose queue is
    /// full or closed are reaped without affecting delivery to the rest.
    /// Returns how many connections accepted the frame.
    pub async fn broadcast(&self, text: &str) -> usize {
        let mut inner = self.inner.lock().await;
        let message = Message::Text(text.to_string());
        let mut failed = Vec::new();
        let mut delivered = 0;

        for (id, entry) in inner.clients.iter() {
            match entry.outbound.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(connection = %id, "Outbound queue full, reaping slow peer");
                    failed.push(*id);
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(connection = %id, "Outbound queue closed, reaping peer");
                    failed.push(*id);
                }
            }
        }

        for id in failed {
            inner.remove(id);
        }
        delivered
    }
}
