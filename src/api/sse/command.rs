//! POST /api/connect - JSON command endpoint

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::registry::ConnectionId;
use crate::relay::RelayServer;
use crate::types::{GameState, RelayError, Role};

/// Request body for POST /api/connect
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    /// Command name
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Role name for `register`
    #[serde(default)]
    pub client_type: Option<String>,

    /// Id from the `connected` stream record; lets `register` set the
    /// stream's role
    #[serde(default)]
    pub connection_id: Option<u64>,

    /// New state for `updateGameState`
    #[serde(default, alias = "state")]
    pub game_state: Option<Value>,
}

/// Commands accepted by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Flap,
    Register,
    GetCommands,
    GetGameState,
    UpdateGameState,
}

impl FromStr for Command {
    type Err = RelayError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "flap" => Ok(Command::Flap),
            "register" => Ok(Command::Register),
            "getCommands" => Ok(Command::GetCommands),
            "getGameState" => Ok(Command::GetGameState),
            "updateGameState" => Ok(Command::UpdateGameState),
            other => Err(RelayError::UnknownCommand(other.to_string())),
        }
    }
}

/// Validate a raw state value against the game state enumeration
pub fn parse_game_state(value: Option<&Value>) -> Result<GameState, RelayError> {
    let value = value.ok_or(RelayError::MissingGameState)?;
    let code = value
        .as_i64()
        .ok_or_else(|| RelayError::MalformedGameState(value.to_string()))?;
    GameState::try_from(code)
}

fn bad_request(body: Value) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// POST /api/connect - Handle a command
pub async fn command_handler(
    State(relay): State<Arc<RelayServer>>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected malformed command: {}", rejection.body_text());
            return bad_request(json!({
                "success": false,
                "message": "Malformed request body",
                "details": rejection.body_text(),
            }));
        }
    };

    let kind = request.kind.clone().unwrap_or_default();
    let command = match kind.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            warn!("Rejected command: {}", e);
            return bad_request(json!({
                "success": false,
                "message": "Unknown message type",
                "receivedType": request.kind,
            }));
        }
    };

    match command {
        Command::Flap => handle_flap(&relay),
        Command::Register => handle_register(&relay, &request),
        Command::GetCommands => handle_get_commands(&relay),
        Command::GetGameState => handle_get_game_state(&relay),
        Command::UpdateGameState => handle_update_game_state(&relay, &request),
    }
}

fn handle_flap(relay: &RelayServer) -> Response {
    let event = relay.buffer_input();
    Json(json!({
        "success": true,
        "message": "Flap command received and queued",
        "id": event.id,
        "timestamp": event.timestamp,
    }))
    .into_response()
}

fn handle_register(relay: &RelayServer, request: &CommandRequest) -> Response {
    let client_type = request.client_type.clone().unwrap_or_default();
    let role = Role::from_client_type(&client_type);

    let registered = match (request.connection_id, role) {
        (Some(id), Some(role)) => relay.register(ConnectionId(id), role),
        _ => false,
    };
    info!(
        "Register request for {} client (stream bound: {})",
        client_type, registered
    );

    Json(json!({
        "success": true,
        "message": format!("{} client registered successfully", client_type),
        "clientType": client_type,
        "registered": registered,
        "timestamp": Utc::now(),
    }))
    .into_response()
}

fn handle_get_commands(relay: &RelayServer) -> Response {
    let commands = relay.drain_commands();
    Json(json!({
        "success": true,
        "commands": commands,
        "timestamp": Utc::now(),
    }))
    .into_response()
}

fn handle_get_game_state(relay: &RelayServer) -> Response {
    let state = relay.game_state();
    Json(json!({
        "success": true,
        "gameState": state,
        "stateName": state.name(),
        "timestamp": Utc::now(),
    }))
    .into_response()
}

fn handle_update_game_state(relay: &RelayServer, request: &CommandRequest) -> Response {
    match parse_game_state(request.game_state.as_ref()) {
        Ok(state) => {
            let notified = relay.update_state(state);
            Json(json!({
                "success": true,
                "gameState": state,
                "stateName": state.name(),
                "notified": notified,
                "timestamp": Utc::now(),
            }))
            .into_response()
        }
        Err(e) => {
            warn!("Rejected game state update: {}", e);
            bad_request(json!({
                "success": false,
                "message": format!("Invalid game state: {}", e),
                "receivedState": request.game_state,
            }))
        }
    }
}
