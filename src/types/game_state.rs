//! Authoritative game state

use std::fmt;

use serde::{Deserialize, Serialize};

use super::RelayError;

/// Current phase of the game as last reported by a display
///
/// Serialized as its numeric code so polling clients can send and
/// compare plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "i64")]
pub enum GameState {
    #[default]
    Idle = 0,
    Active = 1,
    Ended = 2,
}

impl GameState {
    /// Highest valid numeric code
    pub const MAX: i64 = 2;

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Active => "active",
            GameState::Ended => "ended",
        }
    }
}

impl From<GameState> for u8 {
    fn from(state: GameState) -> Self {
        state.code()
    }
}

impl TryFrom<i64> for GameState {
    type Error = RelayError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameState::Idle),
            1 => Ok(GameState::Active),
            2 => Ok(GameState::Ended),
            other => Err(RelayError::InvalidGameState(other)),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
