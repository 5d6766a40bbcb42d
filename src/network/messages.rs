//! Message shapes crossing the network boundary
//!
//! Field-level only. The transport collaborator owns the wire encoding;
//! these enums carry exactly the state the synchronization contract
//! needs.

use glam::Vec3;

use super::SessionId;
use crate::component::{
    Attribute, InteractKind, MetadataKey, MetadataValue, UseCause, UseMethod,
};
use crate::container::transaction::{StackRequest, StackResponse};
use crate::container::ContainerLabel;
use crate::entity::{AbilityKind, EffectType, Gamemode};
use crate::item::ItemStack;
use crate::position::{BlockFace, BlockPosition};

/// Window id of the always-open player inventory
pub const WINDOW_INVENTORY: u8 = 0;
/// Window id of the armor surface
pub const WINDOW_ARMOR: u8 = 120;
/// Window id of the UI surface holding the cursor and crafting grid
pub const WINDOW_UI: u8 = 124;
/// Slot of the cursor within the UI window
pub const UI_CURSOR_SLOT: u32 = 0;
/// First crafting-input slot within the UI window
pub const UI_CRAFTING_INPUT_FIRST_SLOT: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectEventKind {
    Add,
    Remove,
}

/// Outbound state synchronization, one variant per protocol message
#[derive(Debug, Clone)]
pub enum SyncMessage {
    /// Full attribute list of one entity
    AttributeList {
        runtime_id: u64,
        attributes: Vec<Attribute>,
    },
    /// Full metadata snapshot plus the packed flag bits
    ActorData {
        runtime_id: u64,
        metadata: Vec<(MetadataKey, MetadataValue)>,
        flags: u64,
    },
    /// One changed container slot
    ContainerSlot {
        window: u8,
        slot: u32,
        stack: Option<ItemStack>,
    },
    /// Whole container contents
    ContainerContent {
        window: u8,
        stacks: Vec<Option<ItemStack>>,
    },
    /// Answers to a processed stack-request batch
    StackResponses { responses: Vec<StackResponse> },
    EffectEvent {
        runtime_id: u64,
        effect: EffectType,
        event: EffectEventKind,
        duration: i32,
        amplifier: u8,
        show_particles: bool,
    },
    CompletedUsingItem {
        runtime_id: u64,
        method: UseMethod,
    },
    SpawnEntity {
        runtime_id: u64,
        unique_id: i64,
        identifier: String,
        position: Vec3,
        /// Present for item entities, carrying the dropped stack
        stack: Option<ItemStack>,
    },
    DespawnEntity { runtime_id: u64 },
    /// Full ability switch set
    AbilitySet {
        runtime_id: u64,
        abilities: Vec<(AbilityKind, bool)>,
    },
    GamemodeChange {
        runtime_id: u64,
        gamemode: Gamemode,
    },
    OpenContainer {
        window: u8,
        label: ContainerLabel,
        position: BlockPosition,
    },
    CloseContainer { window: u8 },
    BlockUpdate {
        position: BlockPosition,
        network_id: i32,
    },
    /// Pickup animation: which item entity flew to which collector
    PickupItem {
        item_runtime_id: u64,
        collector_runtime_id: u64,
    },
}

/// Inbound client intent, already decoded by the transport layer
#[derive(Debug, Clone)]
pub enum ClientMessage {
    /// A batch of container edit requests
    StackRequests(Vec<StackRequest>),
    /// Use the held item in the air (start eating, throw, ...)
    UseItem { cause: UseCause },
    /// Use the held item against a block face (place, interact)
    UseItemOn {
        position: BlockPosition,
        face: BlockFace,
    },
    UseItemOnEntity {
        target_runtime_id: u64,
        kind: InteractKind,
    },
    /// Let go of a held use (stop eating, loose an arrow)
    ReleaseItem,
    StartBreak { position: BlockPosition },
    AbortBreak { position: BlockPosition },
    /// Mining finished client-side; the server verifies and breaks
    StopBreak { position: BlockPosition },
    SelectSlot { slot: u8 },
    CloseContainer { window: u8 },
    Disconnect,
}

/// A client message tagged with its originating session
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub session: SessionId,
    pub message: ClientMessage,
}

impl InboundMessage {
    pub fn new(session: SessionId, message: ClientMessage) -> Self {
        Self { session, message }
    }
}
