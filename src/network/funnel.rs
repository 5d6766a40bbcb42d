//! Inbound funnel and session bookkeeping
//!
//! Transport threads decode packets and submit them through a cloned
//! [`FunnelHandle`]; the tick thread drains the channel at the start of
//! each tick, so all simulation state is mutated from exactly one
//! thread. The session table is shared the other way: the transport
//! registers connections as they land, the simulation binds them to
//! player entities.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{unbounded, Receiver, Sender};
use dashmap::DashMap;

use super::{ClientMessage, InboundMessage, SessionId};
use crate::error::SimResult;

/// Producer side of the inbound channel, cloneable across threads
#[derive(Debug, Clone)]
pub struct FunnelHandle {
    sender: Sender<InboundMessage>,
}

impl FunnelHandle {
    pub fn submit(&self, session: SessionId, message: ClientMessage) -> SimResult<()> {
        self.sender.send(InboundMessage::new(session, message))?;
        Ok(())
    }
}

/// The tick thread's end of the inbound channel
#[derive(Debug)]
pub struct MessageFunnel {
    sender: Sender<InboundMessage>,
    receiver: Receiver<InboundMessage>,
}

impl Default for MessageFunnel {
    fn default() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }
}

impl MessageFunnel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> FunnelHandle {
        FunnelHandle {
            sender: self.sender.clone(),
        }
    }

    /// Everything submitted since the last drain, in submission order
    pub fn drain(&self) -> Vec<InboundMessage> {
        self.receiver.try_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub username: String,
    /// Runtime id of the bound player entity, once spawned
    pub runtime_id: Option<u64>,
}

/// Connection registry shared between the transport and the simulation
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: DashMap<SessionId, SessionEntry>,
    next_id: AtomicU64,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh session for a new connection
    pub fn open(&self, username: impl Into<String>) -> SessionId {
        let session = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sessions.insert(
            session,
            SessionEntry {
                username: username.into(),
                runtime_id: None,
            },
        );
        session
    }

    pub fn bind_entity(&self, session: SessionId, runtime_id: u64) {
        if let Some(mut entry) = self.sessions.get_mut(&session) {
            entry.runtime_id = Some(runtime_id);
        }
    }

    pub fn entity_for(&self, session: SessionId) -> Option<u64> {
        self.sessions.get(&session)?.runtime_id
    }

    pub fn username_for(&self, session: SessionId) -> Option<String> {
        self.sessions
            .get(&session)
            .map(|entry| entry.username.clone())
    }

    pub fn contains(&self, session: SessionId) -> bool {
        self.sessions.contains_key(&session)
    }

    pub fn close(&self, session: SessionId) -> Option<SessionEntry> {
        self.sessions.remove(&session).map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
