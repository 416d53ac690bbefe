//! Stream side of the transport capability

use tokio::sync::mpsc;

use crate::registry::{CloseReason, Transport};
use crate::types::{Event, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    Event(Event),
    Close,
}

/// Push-capable transport feeding an open SSE response.
///
/// Not probe-capable: the stream's own heartbeat keeps intermediaries
/// from idling it out, and a dropped response tears the connection down.
pub struct StreamTransport {
    tx: mpsc::UnboundedSender<StreamFrame>,
}

impl StreamTransport {
    pub fn new(tx: mpsc::UnboundedSender<StreamFrame>) -> Self {
        Self { tx }
    }
}

impl Transport for StreamTransport {
    fn push(&self, event: &Event) -> Result<(), TransportError> {
        self.tx
            .send(StreamFrame::Event(event.clone()))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&self, _reason: CloseReason) {
        let _ = self.tx.send(StreamFrame::Close);
    }
}
