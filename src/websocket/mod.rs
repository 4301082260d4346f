//! WebSocket side of the relay
//!
//! Wire records, the connection registry with its broadcast, the
//! keepalive state machine, and the per-connection read/write halves.

mod connection;
mod keepalive;
mod message;
mod registry;
mod server;

pub use connection::Connection;
pub use keepalive::{Keepalive, KeepaliveConfig, Liveness};
pub use message::{ChatRecord, ClientMessage, ServerMessage};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use server::WebSocketServer;
