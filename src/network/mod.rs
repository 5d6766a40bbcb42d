//! Network boundary
//!
//! The simulation never touches sockets. Inbound client messages are
//! funneled onto the tick thread through a channel; outbound state goes
//! into a queue that is flushed through a [`PacketSink`] after each
//! tick. The transport collaborator implements the sink and owns the
//! actual wire format.

mod funnel;
mod messages;

pub use funnel::{FunnelHandle, MessageFunnel, SessionTable};
pub use messages::{
    ClientMessage, EffectEventKind, InboundMessage, SyncMessage, UI_CRAFTING_INPUT_FIRST_SLOT,
    UI_CURSOR_SLOT, WINDOW_ARMOR, WINDOW_INVENTORY, WINDOW_UI,
};

/// Opaque handle for one connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Why a session is being torn down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    ClientQuit,
    Timeout,
    Kicked(String),
    ProtocolViolation(String),
    ServerClosed,
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::ClientQuit => write!(f, "client quit"),
            DisconnectReason::Timeout => write!(f, "connection timed out"),
            DisconnectReason::Kicked(message) => write!(f, "kicked: {}", message),
            DisconnectReason::ProtocolViolation(message) => {
                write!(f, "protocol violation: {}", message)
            }
            DisconnectReason::ServerClosed => write!(f, "server closed"),
        }
    }
}

/// Outbound delivery primitive implemented by the transport layer
pub trait PacketSink {
    fn send(&mut self, session: SessionId, message: SyncMessage);

    /// Delivery that skips the transport's own batching. The default
    /// forwards to `send` for sinks without a batching layer.
    fn send_immediate(&mut self, session: SessionId, message: SyncMessage) {
        self.send(session, message);
    }

    fn disconnect(&mut self, session: SessionId, reason: DisconnectReason);
}

/// Per-tick outbound buffer. Everything queued during simulation goes
/// out in one flush: immediate messages first, then the batched ones,
/// then any disconnects.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    immediate: Vec<(SessionId, SyncMessage)>,
    pending: Vec<(SessionId, SyncMessage)>,
    disconnects: Vec<(SessionId, DisconnectReason)>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, session: SessionId, message: SyncMessage) {
        self.pending.push((session, message));
    }

    pub fn send_immediate(&mut self, session: SessionId, message: SyncMessage) {
        self.immediate.push((session, message));
    }

    /// Queue one message for a set of sessions
    pub fn send_many<I>(&mut self, sessions: I, message: SyncMessage)
    where
        I: IntoIterator<Item = SessionId>,
    {
        for session in sessions {
            self.pending.push((session, message.clone()));
        }
    }

    pub fn disconnect(&mut self, session: SessionId, reason: DisconnectReason) {
        log::info!("Disconnecting {}: {}", session, reason);
        self.disconnects.push((session, reason));
    }

    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.pending.is_empty() && self.disconnects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.immediate.len() + self.pending.len()
    }

    pub fn flush(&mut self, sink: &mut dyn PacketSink) {
        for (session, message) in self.immediate.drain(..) {
            sink.send_immediate(session, message);
        }
        for (session, message) in self.pending.drain(..) {
            sink.send(session, message);
        }
        for (session, reason) in self.disconnects.drain(..) {
            sink.disconnect(session, reason);
        }
    }
}

/// Sink that records everything, for tests and offline runs
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<(SessionId, SyncMessage)>,
    pub disconnected: Vec<(SessionId, DisconnectReason)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages_for(&self, session: SessionId) -> Vec<&SyncMessage> {
        self.sent
            .iter()
            .filter(|(target, _)| *target == session)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn clear(&mut self) {
        self.sent.clear();
        self.disconnected.clear();
    }
}

impl PacketSink for RecordingSink {
    fn send(&mut self, session: SessionId, message: SyncMessage) {
        self.sent.push((session, message));
    }

    fn disconnect(&mut self, session: SessionId, reason: DisconnectReason) {
        self.disconnected.push((session, reason));
    }
}
