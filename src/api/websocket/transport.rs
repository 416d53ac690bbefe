//! Socket side of the transport capability

use tokio::sync::mpsc;

use super::events::render;
use crate::registry::{CloseReason, Transport};
use crate::types::{Event, TransportError};

/// Frames queued for a socket's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Probe,
    Close(CloseReason),
}

/// Push-capable, probe-capable transport backed by a socket writer task
pub struct SocketTransport {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl SocketTransport {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }
}

impl Transport for SocketTransport {
    fn push(&self, event: &Event) -> Result<(), TransportError> {
        match render(event) {
            Some(text) => self
                .tx
                .send(Outbound::Text(text))
                .map_err(|_| TransportError::Closed),
            None => Ok(()),
        }
    }

    fn supports_probe(&self) -> bool {
        true
    }

    fn probe(&self) -> Result<(), TransportError> {
        self.tx
            .send(Outbound::Probe)
            .map_err(|_| TransportError::Closed)
    }

    fn close(&self, reason: CloseReason) {
        let _ = self.tx.send(Outbound::Close(reason));
    }
}
