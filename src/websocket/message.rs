use serde::{Deserialize, Serialize};

use crate::room::{Role, Snapshot};

/// Records a client may send. Any other `type` decodes as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Move {
        #[serde(default)]
        from: String,
        #[serde(default)]
        to: String,
        #[serde(default)]
        promotion: String,
        #[serde(default)]
        fen: String,
    },
    Chat(ChatRecord),
    Restart,
    #[serde(other)]
    Unknown,
}

/// Records the server produces.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Color {
        color: Role,
    },
    #[serde(rename_all = "camelCase")]
    GameState {
        fen: String,
        move_history: String,
        chat_history: String,
    },
    Chat(ChatRecord),
}

/// A chat record as relayed: `message` is replaced by the rendered line and
/// any other field the sender set is echoed. Empty fields are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub promotion: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fen: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub move_history: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chat_history: String,
}

impl From<Snapshot> for ServerMessage {
    fn from(snapshot: Snapshot) -> Self {
        ServerMessage::GameState {
            fen: snapshot.position,
            move_history: snapshot.move_history,
            chat_history: snapshot.chat_history,
        }
    }
}

impl ServerMessage {
    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
