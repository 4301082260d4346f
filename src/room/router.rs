use tracing::{debug, info};

use super::Room;
use crate::error::WebSocketError;
use crate::websocket::{ClientMessage, ConnectionId, ServerMessage};

/// What happened to one inbound record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed and the frame reached this many connections.
    Broadcast(usize),
    /// A spectator tried to move or restart. Dropped without a reply.
    Unauthorized,
    /// Unknown record type.
    Ignored,
    /// The sender is no longer registered.
    Detached,
}

impl Room {
    /// Applies one inbound text record on behalf of `id`.
    ///
    /// Moves and restarts are relayed byte-for-byte; chat is re-encoded with
    /// the rendered line in place of the sender's text. Decode failures come back as
    /// `WebSocketError::InvalidFormat` and leave the room untouched.
    pub async fn dispatch(&self, id: ConnectionId, raw: &str) -> Result<Outcome, WebSocketError> {
        let msg: ClientMessage = serde_json::from_str(raw)?;

        let mut session = self.session.lock().await;
        let role = match self.registry.role_of(id).await {
            Some(role) => role,
            None => return Ok(Outcome::Detached),
        };

        match msg {
            ClientMessage::Move { from, to, fen, .. } => {
                if !role.is_player() {
                    debug!(connection = %id, "Ignoring move from spectator");
                    return Ok(Outcome::Unauthorized);
                }
                session.apply_move(role, &from, &to, &fen);
                Ok(Outcome::Broadcast(self.registry.broadcast(raw).await))
            }
            ClientMessage::Chat(mut record) => {
                record.message = session.record_chat(role, &record.message);
                let text = ServerMessage::Chat(record).to_text()?;
                Ok(Outcome::Broadcast(self.registry.broadcast(&text).await))
            }
            ClientMessage::Restart => {
                if !role.is_player() {
                    debug!(connection = %id, "Ignoring restart from spectator");
                    return Ok(Outcome::Unauthorized);
                }
                session.restart();
                info!(connection = %id, role = %role, "Room restarted");
                Ok(Outcome::Broadcast(self.registry.broadcast(raw).await))
            }
            ClientMessage::Unknown => {
                debug!(connection = %id, "Ignoring message of unknown type");
                Ok(Outcome::Ignored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Role, INITIAL_POSITION};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    struct Peer {
        id: ConnectionId,
        role: Role,
        rx: mpsc::Receiver<Message>,
    }

    impl Peer {
        fn next(&mut self) -> Option<String> {
            match self.rx.try_recv().ok()? {
                Message::Text(text) => Some(text),
                other => panic!("unexpected frame {:?}", other),
            }
        }

        fn next_json(&mut self) -> Value {
            serde_json::from_str(&self.next().expect("expected a frame")).unwrap()
        }
    }

    async fn join(room: &Room) -> Peer {
        let (tx, rx) = mpsc::channel(16);
        let (id, role) = room.join(tx).await.unwrap();
        let mut peer = Peer { id, role, rx };
        assert_eq!(peer.next_json()["type"], "color");
        assert_eq!(peer.next_json()["type"], "gameState");
        peer
    }

    #[tokio::test]
    async fn test_join_sends_role_then_snapshot() {
        let room = Room::new();
        let (tx, mut rx) = mpsc::channel(4);
        let (_, role) = room.join(tx).await.unwrap();
        assert_eq!(role, Role::White);

        let Message::Text(color) = rx.try_recv().unwrap() else { panic!() };
        let Message::Text(state) = rx.try_recv().unwrap() else { panic!() };
        assert_eq!(serde_json::from_str::<Value>(&color).unwrap(), json!({"type": "color", "color": "white"}));
        assert_eq!(
            serde_json::from_str::<Value>(&state).unwrap(),
            json!({"type": "gameState", "fen": INITIAL_POSITION, "moveHistory": "", "chatHistory": ""})
        );
    }

    #[tokio::test]
    async fn test_move_from_player_is_relayed_verbatim() {
        let room = Room::new();
        let mut a = join(&room).await;
        let mut b = join(&room).await;
        let mut c = join(&room).await;
        assert_eq!((a.role, b.role, c.role), (Role::White, Role::Black, Role::Spectator));

        let raw = r#"{"type":"move","fen":"pos2","from":"e2","to":"e4"}"#;
        assert_eq!(room.dispatch(a.id, raw).await.unwrap(), Outcome::Broadcast(3));

        for peer in [&mut a, &mut b, &mut c] {
            assert_eq!(peer.next().as_deref(), Some(raw));
        }
        let session = room.session().await;
        assert_eq!(session.position(), "pos2");
        assert_eq!(session.move_log(), ["white: e2-e4"]);
    }

    #[tokio::test]
    async fn test_move_from_spectator_changes_nothing() {
        let room = Room::new();
        let mut a = join(&room).await;
        let _b = join(&room).await;
        let c = join(&room).await;

        let raw = r#"{"type":"move","fen":"hacked","from":"e2","to":"e4"}"#;
        assert_eq!(room.dispatch(c.id, raw).await.unwrap(), Outcome::Unauthorized);
        assert_eq!(a.next(), None);

        let session = room.session().await;
        assert_eq!(session.position(), INITIAL_POSITION);
        assert!(session.move_log().is_empty());
    }

    #[tokio::test]
    async fn test_spectator_chat_is_labelled_and_broadcast() {
        let room = Room::new();
        let mut a = join(&room).await;
        let mut b = join(&room).await;
        let mut c = join(&room).await;

        let outcome = room.dispatch(c.id, r#"{"type":"chat","message":"hello"}"#).await.unwrap();
        assert_eq!(outcome, Outcome::Broadcast(3));
        for peer in [&mut a, &mut b, &mut c] {
            assert_eq!(peer.next_json(), json!({"type": "chat", "message": "Spectator: hello"}));
        }

        let session = room.session().await;
        assert_eq!(session.chat_log(), ["Spectator: hello"]);
        assert_eq!(session.position(), INITIAL_POSITION);
        assert!(session.move_log().is_empty());
    }

    #[tokio::test]
    async fn test_chat_echoes_fields_the_sender_set() {
        let room = Room::new();
        let mut a = join(&room).await;
        let mut b = join(&room).await;

        room.dispatch(a.id, r#"{"type":"chat","message":"hi","color":"white","fen":"f","to":""}"#)
            .await
            .unwrap();
        for peer in [&mut a, &mut b] {
            assert_eq!(
                peer.next_json(),
                json!({"type": "chat", "message": "white: hi", "color": "white", "fen": "f"})
            );
        }
        assert_eq!(room.session().await.position(), INITIAL_POSITION);
    }

    #[tokio::test]
    async fn test_restart_resets_board_but_keeps_chat() {
        let room = Room::new();
        let mut a = join(&room).await;
        let mut b = join(&room).await;
        let c = join(&room).await;

        room.dispatch(a.id, r#"{"type":"move","fen":"pos2","from":"e2","to":"e4"}"#).await.unwrap();
        room.dispatch(b.id, r#"{"type":"chat","message":"gg"}"#).await.unwrap();
        a.next();
        a.next();

        assert_eq!(room.dispatch(c.id, r#"{"type":"restart"}"#).await.unwrap(), Outcome::Unauthorized);
        assert_eq!(room.session().await.position(), "pos2");
        assert_eq!(a.next(), None);

        let raw = r#"{"type":"restart"}"#;
        assert_eq!(room.dispatch(b.id, raw).await.unwrap(), Outcome::Broadcast(3));
        assert_eq!(a.next().as_deref(), Some(raw));

        let session = room.session().await;
        assert_eq!(session.position(), INITIAL_POSITION);
        assert!(session.move_log().is_empty());
        assert_eq!(session.chat_log(), ["black: gg"]);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_records() {
        let room = Room::new();
        let mut a = join(&room).await;

        assert_eq!(room.dispatch(a.id, r#"{"type":"resign"}"#).await.unwrap(), Outcome::Ignored);
        let err = room.dispatch(a.id, "{{nope").await.unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(a.next(), None);
        assert_eq!(room.session().await.position(), INITIAL_POSITION);
    }

    #[tokio::test]
    async fn test_late_joiner_catches_up_and_reaped_sender_is_detached() {
        let room = Room::new();
        let a = join(&room).await;
        room.dispatch(a.id, r#"{"type":"move","fen":"pos2","from":"e2","to":"e4"}"#).await.unwrap();
        room.dispatch(a.id, r#"{"type":"chat","message":"hi"}"#).await.unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let (_, role) = room.join(tx).await.unwrap();
        assert_eq!(role, Role::Black);
        rx.try_recv().unwrap();
        let Message::Text(state) = rx.try_recv().unwrap() else { panic!() };
        assert_eq!(
            serde_json::from_str::<Value>(&state).unwrap(),
            json!({
                "type": "gameState",
                "fen": "pos2",
                "moveHistory": "<p>white: e2-e4</p>",
                "chatHistory": "<p>white: hi</p>"
            })
        );

        room.leave(a.id).await;
        let outcome = room.dispatch(a.id, r#"{"type":"move","fen":"x","from":"a","to":"b"}"#).await.unwrap();
        assert_eq!(outcome, Outcome::Detached);
        assert_eq!(room.session().await.position(), "pos2");
    }
}
