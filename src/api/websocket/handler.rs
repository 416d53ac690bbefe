//! WebSocket connection handler

use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::events::SocketCommand;
use super::transport::{Outbound, SocketTransport};
use crate::api::peer_info;
use crate::registry::{ConnectionId, PeerInfo};
use crate::relay::RelayServer;

/// How long the writer gets to flush the closing frame
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(relay): State<Arc<RelayServer>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let peer = peer_info(connect_info, &headers);
    ws.on_upgrade(move |socket| handle_socket(socket, relay, peer))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, relay: Arc<RelayServer>, peer: PeerInfo) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let id = relay.connect_from(None, Arc::new(SocketTransport::new(tx)), &peer);

    // Writer: drains the outbound queue until the relay closes us or the
    // peer stops accepting frames.
    let mut writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let (message, last) = match outbound {
                Outbound::Text(text) => (Message::Text(text), false),
                Outbound::Probe => (Message::Ping(Vec::new()), false),
                Outbound::Close(reason) => (
                    Message::Close(Some(CloseFrame {
                        code: close_code::NORMAL,
                        reason: Cow::from(reason.as_str()),
                    })),
                    true,
                ),
            };
            if sender.send(message).await.is_err() || last {
                break;
            }
        }
    });

    let mut writer_done = false;
    loop {
        tokio::select! {
            // Writer finished: the relay closed this connection
            _ = &mut writer => {
                writer_done = true;
                break;
            }

            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => handle_client_message(&relay, id, &text),
                    Some(Ok(Message::Pong(_))) => relay.registry().mark_alive(id),
                    Some(Ok(Message::Close(frame))) => {
                        debug!("Client {} sent close: {:?}", id, frame);
                        break;
                    }
                    Some(Ok(_)) => {} // Binary and client pings are ignored
                    Some(Err(e)) => {
                        warn!("WebSocket error for client {}: {}", id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    relay.disconnect(id);

    // Let the writer flush the close reply before giving up on it
    if !writer_done && timeout(CLOSE_FLUSH_TIMEOUT, &mut writer).await.is_err() {
        debug!("Writer for client {} did not finish, aborting", id);
        writer.abort();
    }
}

/// Handle a bare-string command from the client
fn handle_client_message(relay: &RelayServer, id: ConnectionId, text: &str) {
    debug!("Client {} sent: {}", id, text);

    match text.parse::<SocketCommand>() {
        Ok(SocketCommand::Flap) => {
            relay.push_input(Some(id));
        }
        Ok(SocketCommand::Register(role)) => {
            relay.register(id, role);
        }
        Ok(SocketCommand::UpdateGameState(state)) => {
            relay.update_state(state);
        }
        Err(e) => warn!("Dropping message from client {}: {}", id, e),
    }
}
