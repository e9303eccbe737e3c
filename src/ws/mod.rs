//! Peer link: wire protocol, host endpoint and client dialer

pub mod client;
pub mod handler;
pub mod protocol;
mod session;

use tokio::sync::mpsc;
use tracing::debug;

pub use protocol::NetMessage;

/// Outbound queue depth per peer; messages beyond it are dropped
pub const OUTBOUND_CAPACITY: usize = 256;

/// Capacity of the link event channel feeding the session
pub const EVENT_CAPACITY: usize = 512;

/// Fire-and-forget handle for sending to the paired peer
#[derive(Debug, Clone)]
pub struct PeerSender {
    tx: mpsc::Sender<NetMessage>,
}

impl PeerSender {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NetMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue a message; returns false if it was dropped
    pub fn send(&self, msg: NetMessage) -> bool {
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                debug!(kind = msg.kind(), "Outbound queue full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Everything the transport reports to the session owner
#[derive(Debug)]
pub enum LinkEvent {
    /// Peer paired; use the sender for outbound traffic
    Opened(PeerSender),
    /// Decoded inbound message
    Data(NetMessage),
    /// Peer went away
    Closed,
    /// Transport failed; carries a short reason for the status line
    Error(String),
}

/// Transport setup errors
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("connection failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (sender, mut rx) = PeerSender::channel(1);
        assert!(sender.send(NetMessage::start_game()));
        assert!(!sender.send(NetMessage::Input { keys: vec![] }));
        assert_eq!(rx.try_recv().unwrap(), NetMessage::start_game());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_is_reported() {
        let (sender, rx) = PeerSender::channel(4);
        drop(rx);
        assert!(sender.is_closed());
        assert!(!sender.send(NetMessage::start_game()));
    }
}
