//! Embercraft - voxel-server simulation core
//!
//! The component framework, container/transaction engine and tick loop
//! behind a multiplayer voxel server. Everything simulates on one
//! thread: inbound client intent funnels through a channel into the
//! tick, mutations queue sync messages, and the queue flushes through a
//! [`network::PacketSink`] owned by the transport collaborator.
//!
//! The crate is transport-agnostic by design. Sockets, chunk terrain
//! and command parsing live elsewhere; this is the piece that decides
//! what a chest holds, how long stone takes to mine, and which clients
//! hear about it.

pub mod component;
pub mod config;
pub mod container;
pub mod entity;
pub mod error;
pub mod item;
pub mod nbt;
pub mod network;
pub mod position;
pub mod registry;
pub mod world;

pub use config::SimulationConfig;
pub use error::{SimError, SimResult};
pub use world::{World, OVERWORLD};

/// Protocol-facing constants shared with the transport layer
pub mod protocol {
    pub use crate::network::{
        UI_CRAFTING_INPUT_FIRST_SLOT, UI_CURSOR_SLOT, WINDOW_ARMOR, WINDOW_INVENTORY, WINDOW_UI,
    };
}
