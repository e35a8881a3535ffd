//! Outbound message transport
//!
//! Fire-and-forget by contract: a send failure is logged by the caller and
//! never gates a local state transition. Delivery, retries and reachability
//! live below this seam.

use gonio_core::{GonioError, GonioResult};
use gonio_wire::Message;

/// Outbound half of the device link.
pub trait Transport: Send + Sync {
    fn send(&self, message: &Message) -> GonioResult<()>;
}

/// Transport that drops everything. For nodes running without a peer.
#[derive(Debug, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, _message: &Message) -> GonioResult<()> {
        Ok(())
    }
}

/// Transport backed by a tokio channel, for in-process links between a node
/// and a mirror driven from another task.
pub struct ChannelTransport {
    tx: tokio::sync::mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelTransport {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (ChannelTransport { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, message: &Message) -> GonioResult<()> {
        self.tx
            .send(message.encode())
            .map_err(|_| GonioError::TransportError("channel closed".into()))
    }
}
