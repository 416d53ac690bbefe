//! Bare-string protocol spoken over the WebSocket binding

use std::str::FromStr;

use crate::types::{Event, EventKind, GameState, RelayError, Role};

/// Input event
pub const FLAP: &str = "flap";
/// Register as display
pub const GAME_CLIENT: &str = "game-client";
/// Register as controller
pub const MOBILE_CLIENT: &str = "mobile-client";
/// Display registration acknowledgment
pub const GAME_CONNECTED: &str = "game-connected";
/// Controller registration acknowledgment
pub const MOBILE_CONNECTED: &str = "mobile-connected";
/// Prefix of a state update, e.g. `game-state:1`
pub const GAME_STATE_PREFIX: &str = "game-state:";

/// A command received from a socket client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketCommand {
    Flap,
    Register(Role),
    UpdateGameState(GameState),
}

impl FromStr for SocketCommand {
    type Err = RelayError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        match text {
            FLAP => return Ok(SocketCommand::Flap),
            GAME_CLIENT => return Ok(SocketCommand::Register(Role::Display)),
            MOBILE_CLIENT => return Ok(SocketCommand::Register(Role::Controller)),
            _ => {}
        }

        if let Some(value) = text.strip_prefix(GAME_STATE_PREFIX) {
            let code: i64 = value
                .trim()
                .parse()
                .map_err(|_| RelayError::MalformedGameState(value.to_string()))?;
            return GameState::try_from(code).map(SocketCommand::UpdateGameState);
        }

        Err(RelayError::UnknownCommand(text.to_string()))
    }
}

/// Render a relay event as the frame a socket client expects.
///
/// Returns `None` for events that have no bare-string form.
pub fn render(event: &Event) -> Option<String> {
    match &event.kind {
        EventKind::Input => Some(FLAP.to_string()),
        EventKind::Registration {
            role: Role::Display,
        } => Some(GAME_CONNECTED.to_string()),
        EventKind::Registration {
            role: Role::Controller,
        } => Some(MOBILE_CONNECTED.to_string()),
        EventKind::Registration {
            role: Role::Unspecified,
        } => None,
        EventKind::StateUpdate { state } => Some(format!("{}{}", GAME_STATE_PREFIX, state.code())),
        EventKind::Heartbeat => None,
    }
}
