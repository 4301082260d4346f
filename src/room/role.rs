use serde::{Serialize, Serializer};
use std::fmt;

pub const SPECTATOR_LABEL: &str = "Spectator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    White,
    Black,
    Spectator,
}

impl Role {
    /// Wire name; spectators are the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::White => "white",
            Role::Black => "black",
            Role::Spectator => "",
        }
    }

    /// Only the two players may move or restart.
    pub fn is_player(&self) -> bool {
        !matches!(self, Role::Spectator)
    }

    /// Name shown in front of chat lines.
    pub fn speaker(&self) -> &'static str {
        match self {
            Role::Spectator => SPECTATOR_LABEL,
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.speaker())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Occupancy of the two player seats.
#[derive(Debug, Default, Clone)]
pub struct RoleSlots {
    white: bool,
    black: bool,
}

impl RoleSlots {
    /// First come, first served: white, then black, then spectator.
    pub fn assign(&mut self) -> Role {
        if !self.white {
            self.white = true;
            Role::White
        } else if !self.black {
            self.black = true;
            Role::Black
        } else {
            Role::Spectator
        }
    }

    pub fn release(&mut self, role: Role) {
        match role {
            Role::White => self.white = false,
            Role::Black => self.black = false,
            Role::Spectator => {}
        }
    }

    pub fn is_occupied(&self, role: Role) -> bool {
        match role {
            Role::White => self.white,
            Role::Black => self.black,
            Role::Spectator => false,
        }
    }
}
