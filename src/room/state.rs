use super::Role;

/// Standard chess starting position in FEN.
pub const INITIAL_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Board position plus the move and chat logs shared by everyone in the room.
///
/// The position is opaque: whatever a player submits is stored as-is.
#[derive(Debug, Clone)]
pub struct SessionState {
    position: String,
    move_log: Vec<String>,
    chat_log: Vec<String>,
}

/// What a joining connection needs to catch up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub position: String,
    pub move_history: String,
    pub chat_history: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            position: INITIAL_POSITION.to_string(),
            move_log: Vec::new(),
            chat_log: Vec::new(),
        }
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn move_log(&self) -> &[String] {
        &self.move_log
    }

    pub fn chat_log(&self) -> &[String] {
        &self.chat_log
    }

    pub fn apply_move(&mut self, role: Role, from: &str, to: &str, position: &str) {
        self.position = position.to_string();
        self.move_log.push(format!("{}: {}-{}", role.as_str(), from, to));
    }

    /// Appends a chat line and returns the rendered record.
    pub fn record_chat(&mut self, role: Role, text: &str) -> String {
        let record = format!("{}: {}", role.speaker(), text);
        self.chat_log.push(record.clone());
        record
    }

    /// Back to the starting position. Chat survives a restart.
    pub fn restart(&mut self) {
        self.position = INITIAL_POSITION.to_string();
        self.move_log.clear();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            position: self.position.clone(),
            move_history: render_block(&self.move_log),
            chat_history: render_block(&self.chat_log),
        }
    }
}

fn render_block(records: &[String]) -> String {
    records.iter().map(|r| format!("<p>{}</p>", r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_initial_position() {
        let state = SessionState::new();
        assert_eq!(state.position(), INITIAL_POSITION);
        assert!(state.move_log().is_empty());
        assert!(state.chat_log().is_empty());
    }

    #[test]
    fn test_move_overwrites_position_and_logs() {
        let mut state = SessionState::new();
        state.apply_move(Role::White, "e2", "e4", "pos2");
        assert_eq!(state.position(), "pos2");
        assert_eq!(state.move_log(), ["white: e2-e4"]);
    }

    #[test]
    fn test_chat_uses_spectator_label() {
        let mut state = SessionState::new();
        let record = state.record_chat(Role::Spectator, "nice move");
        assert_eq!(record, "Spectator: nice move");
        assert_eq!(state.record_chat(Role::Black, "thanks"), "black: thanks");
        assert_eq!(state.chat_log().len(), 2);
        assert_eq!(state.position(), INITIAL_POSITION);
    }

    #[test]
    fn test_restart_keeps_chat() {
        let mut state = SessionState::new();
        state.apply_move(Role::White, "e2", "e4", "pos2");
        state.record_chat(Role::White, "gl");
        state.restart();
        assert_eq!(state.position(), INITIAL_POSITION);
        assert!(state.move_log().is_empty());
        assert_eq!(state.chat_log(), ["white: gl"]);
    }

    #[test]
    fn test_snapshot_blocks() {
        let mut state = SessionState::new();
        state.apply_move(Role::White, "e2", "e4", "pos2");
        state.apply_move(Role::Black, "e7", "e5", "pos3");
        state.record_chat(Role::Spectator, "hi");

        let snapshot = state.snapshot();
        assert_eq!(snapshot.position, "pos3");
        assert_eq!(snapshot.move_history, "<p>white: e2-e4</p><p>black: e7-e5</p>");
        assert_eq!(snapshot.chat_history, "<p>Spectator: hi</p>");

        let empty = SessionState::new().snapshot();
        assert_eq!(empty.move_history, "");
        assert_eq!(empty.chat_history, "");
    }
}
