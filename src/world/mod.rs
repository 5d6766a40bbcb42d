//! World state and the tick loop
//!
//! A world owns its dimensions, the type and component registries, the
//! inbound funnel and the outbound queue. Everything mutates on the
//! tick thread: inbound messages drain at the start of a tick, component
//! and effect scheduling runs synchronously, and the queue flushes
//! through the packet sink once the tick completes.

mod block;
mod dispatch;
mod interact;
mod sync;
mod tick;

pub use block::BlockEntry;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use glam::Vec3;

use crate::component::{vanilla_bindings, ComponentRegistry};
use crate::config::SimulationConfig;
use crate::entity::{Effect, Entity, PlayerData};
use crate::error::{SimError, SimResult};
use crate::network::{
    FunnelHandle, MessageFunnel, OutboundQueue, SessionId, SessionTable, SyncMessage,
};
use crate::position::BlockPosition;
use crate::registry::{BlockType, Registries, RegistryEntry};

pub const OVERWORLD: &str = "minecraft:overworld";

/// Borrowed world state handed into component hooks and dispatch
pub struct TickContext<'a> {
    pub current_tick: u64,
    pub config: &'a SimulationConfig,
    pub registries: &'a Registries,
    pub components: &'a ComponentRegistry,
    pub outbound: &'a mut OutboundQueue,
}

/// One dimension's live objects: the entity registry keyed by runtime
/// id (spawn order) and the sparse block store
pub struct Dimension {
    identifier: String,
    entities: BTreeMap<u64, Entity>,
    blocks: BTreeMap<BlockPosition, BlockEntry>,
}

impl Dimension {
    fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            entities: BTreeMap::new(),
            blocks: BTreeMap::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn entity(&self, runtime_id: u64) -> Option<&Entity> {
        self.entities.get(&runtime_id)
    }

    pub fn entity_mut(&mut self, runtime_id: u64) -> Option<&mut Entity> {
        self.entities.get_mut(&runtime_id)
    }

    /// Detach an entity so it can be mutated alongside the dimension;
    /// callers put it back with [`Dimension::put_entity`].
    pub fn take_entity(&mut self, runtime_id: u64) -> Option<Entity> {
        self.entities.remove(&runtime_id)
    }

    pub fn put_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.runtime_id(), entity);
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Runtime ids in spawn order
    pub fn runtime_ids(&self) -> Vec<u64> {
        self.entities.keys().copied().collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn player_by_session(&self, session: SessionId) -> Option<u64> {
        self.entities
            .values()
            .find(|entity| entity.session() == Some(session))
            .map(Entity::runtime_id)
    }

    /// Sessions of every connected player in this dimension
    pub fn player_sessions(&self) -> Vec<SessionId> {
        self.entities.values().filter_map(Entity::session).collect()
    }

    pub fn block_at(&self, position: BlockPosition) -> Option<&BlockEntry> {
        self.blocks.get(&position)
    }

    pub fn block_at_mut(&mut self, position: BlockPosition) -> Option<&mut BlockEntry> {
        self.blocks.get_mut(&position)
    }

    pub fn take_block(&mut self, position: BlockPosition) -> Option<BlockEntry> {
        self.blocks.remove(&position)
    }

    pub fn put_block(&mut self, entry: BlockEntry) {
        self.blocks.insert(entry.position(), entry);
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Block positions in coordinate order
    pub fn block_positions(&self) -> Vec<BlockPosition> {
        self.blocks.keys().copied().collect()
    }
}

pub struct World {
    config: SimulationConfig,
    registries: Registries,
    component_registry: ComponentRegistry,
    dimensions: BTreeMap<String, Dimension>,
    sessions: Arc<SessionTable>,
    funnel: MessageFunnel,
    outbound: OutboundQueue,
    current_tick: u64,
    next_runtime_id: u64,
    /// Epoch seconds at construction; unique ids derive from it
    epoch_base: i64,
}

impl World {
    pub fn new(
        config: SimulationConfig,
        registries: Registries,
        component_registry: ComponentRegistry,
    ) -> Self {
        let mut dimensions = BTreeMap::new();
        dimensions.insert(OVERWORLD.to_string(), Dimension::new(OVERWORLD));
        Self {
            config,
            registries,
            component_registry,
            dimensions,
            sessions: Arc::new(SessionTable::new()),
            funnel: MessageFunnel::new(),
            outbound: OutboundQueue::new(),
            current_tick: 0,
            next_runtime_id: 1,
            epoch_base: Utc::now().timestamp(),
        }
    }

    /// A world with the vanilla types and component bindings loaded
    pub fn vanilla(config: SimulationConfig) -> SimResult<Self> {
        let registries = Registries::vanilla()?;
        let component_registry = vanilla_bindings(&registries);
        Ok(Self::new(config, registries, component_registry))
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn sessions(&self) -> Arc<SessionTable> {
        Arc::clone(&self.sessions)
    }

    /// Producer handle for the transport layer
    pub fn handle(&self) -> FunnelHandle {
        self.funnel.handle()
    }

    pub fn dimension(&self, identifier: &str) -> Option<&Dimension> {
        self.dimensions.get(identifier)
    }

    pub fn dimension_mut(&mut self, identifier: &str) -> Option<&mut Dimension> {
        self.dimensions.get_mut(identifier)
    }

    pub fn overworld(&self) -> &Dimension {
        match self.dimensions.get(OVERWORLD) {
            Some(dimension) => dimension,
            None => unreachable!("overworld exists from construction"),
        }
    }

    pub fn overworld_mut(&mut self) -> &mut Dimension {
        match self.dimensions.get_mut(OVERWORLD) {
            Some(dimension) => dimension,
            None => unreachable!("overworld exists from construction"),
        }
    }

    fn allocate_ids(&mut self) -> (u64, i64) {
        let runtime_id = self.next_runtime_id;
        self.next_runtime_id += 1;
        let unique_id = (self.epoch_base << 20) + runtime_id as i64;
        (runtime_id, unique_id)
    }

    /// Spawn an entity of a registered type. Components instantiate in
    /// binding order and their spawn hooks run before the entity is
    /// visible to anyone.
    pub fn spawn_entity(
        &mut self,
        dimension_id: &str,
        type_identifier: &str,
        position: Vec3,
    ) -> SimResult<u64> {
        let entity_type =
            self.registries
                .entities
                .get(type_identifier)
                .ok_or(SimError::UnknownType {
                    kind: "entity",
                    identifier: type_identifier.to_string(),
                })?;
        let (runtime_id, unique_id) = self.allocate_ids();
        let mut entity = Entity::new(entity_type, runtime_id, unique_id, position);
        entity.components = self
            .component_registry
            .instantiate_entity(entity.entity_type().as_ref())?;

        let dimension = self
            .dimensions
            .get_mut(dimension_id)
            .ok_or_else(|| SimError::Internal {
                message: format!("unknown dimension '{}'", dimension_id),
            })?;
        let mut ctx = TickContext {
            current_tick: self.current_tick,
            config: &self.config,
            registries: &self.registries,
            components: &self.component_registry,
            outbound: &mut self.outbound,
        };
        dispatch::spawn_entity_components(&mut entity, &mut ctx)?;
        log::debug!(
            "Spawned '{}' as runtime id {} in {}",
            entity.identifier(),
            runtime_id,
            dimension_id
        );
        dimension.put_entity(entity);
        Ok(runtime_id)
    }

    /// Spawn a player entity bound to a connected session and push its
    /// initial state to the client.
    pub fn spawn_player(
        &mut self,
        dimension_id: &str,
        session: SessionId,
        position: Vec3,
    ) -> SimResult<u64> {
        let username = self
            .sessions
            .username_for(session)
            .ok_or(SimError::SessionNotFound {
                session: session.raw(),
            })?;
        let runtime_id = self.spawn_entity(dimension_id, "minecraft:player", position)?;
        let dimension = self
            .dimensions
            .get_mut(dimension_id)
            .ok_or_else(|| SimError::Internal {
                message: format!("unknown dimension '{}'", dimension_id),
            })?;
        let entity = dimension
            .entity_mut(runtime_id)
            .ok_or(SimError::EntityNotFound { runtime_id })?;
        entity.player = Some(PlayerData::new(session, username));
        self.sessions.bind_entity(session, runtime_id);

        // Nametag and join-state sync need the player data in place, so
        // they run here rather than in the spawn hooks
        sync::send_player_join_state(entity, &mut self.outbound);
        log::info!("Player session {} spawned as runtime id {}", session, runtime_id);
        Ok(runtime_id)
    }

    /// Drop a stack into the world as an item entity
    pub fn spawn_item(
        &mut self,
        dimension_id: &str,
        stack: crate::item::ItemStack,
        position: Vec3,
        velocity: Vec3,
    ) -> SimResult<u64> {
        use crate::component::entity::ItemEntityComponent;

        let runtime_id = self.spawn_entity(dimension_id, "minecraft:item", position)?;
        let current_tick = self.current_tick;
        let view_distance = self.config.view_distance;
        let dimension = self
            .dimensions
            .get_mut(dimension_id)
            .ok_or_else(|| SimError::Internal {
                message: format!("unknown dimension '{}'", dimension_id),
            })?;
        let entity = dimension
            .entity_mut(runtime_id)
            .ok_or(SimError::EntityNotFound { runtime_id })?;
        entity.velocity = velocity;
        let stack_for_message = stack.clone();
        match entity
            .components
            .get_as_mut::<ItemEntityComponent>("minecraft:item")
        {
            Some(item) => item.set_stack(stack, current_tick),
            None => {
                return Err(SimError::ComponentMissing {
                    owner: "minecraft:item".to_string(),
                    identifier: "minecraft:item".to_string(),
                })
            }
        }
        let unique_id = entity.unique_id();
        let identifier = entity.identifier().to_string();

        // Announce to everyone already in range; observer reconciliation
        // covers players arriving later
        let sessions: Vec<SessionId> = dimension
            .entities()
            .filter(|other| other.is_player())
            .filter(|other| sync::within_chunk_distance(other.position, position, view_distance))
            .filter_map(Entity::session)
            .collect();
        if let Some(entity) = dimension.entity_mut(runtime_id) {
            entity.observers.extend(sessions.iter().copied());
        }
        self.outbound.send_many(
            sessions,
            SyncMessage::SpawnEntity {
                runtime_id,
                unique_id,
                identifier,
                position,
                stack: Some(stack_for_message),
            },
        );
        Ok(runtime_id)
    }

    /// Place a block of a registered type, replacing whatever was there.
    /// Air clears the position.
    pub fn set_block(
        &mut self,
        dimension_id: &str,
        position: BlockPosition,
        type_identifier: &str,
    ) -> SimResult<()> {
        self.set_block_inner(dimension_id, position, type_identifier, None)
    }

    pub(crate) fn set_block_inner(
        &mut self,
        dimension_id: &str,
        position: BlockPosition,
        type_identifier: &str,
        player: Option<&mut Entity>,
    ) -> SimResult<()> {
        let block_type =
            self.registries
                .blocks
                .get(type_identifier)
                .ok_or(SimError::UnknownType {
                    kind: "block",
                    identifier: type_identifier.to_string(),
                })?;
        let dimension = self
            .dimensions
            .get_mut(dimension_id)
            .ok_or_else(|| SimError::Internal {
                message: format!("unknown dimension '{}'", dimension_id),
            })?;

        if block_type.is_air() {
            dimension.take_block(position);
        } else {
            let mut entry = BlockEntry::new(position, Arc::clone(&block_type));
            entry.components = self.component_registry.instantiate_block(&block_type)?;
            let mut ctx = TickContext {
                current_tick: self.current_tick,
                config: &self.config,
                registries: &self.registries,
                components: &self.component_registry,
                outbound: &mut self.outbound,
            };
            dispatch::place_block_components(&mut entry, player, &mut ctx)?;
            dimension.put_block(entry);
        }

        let sessions = dimension.player_sessions();
        self.outbound.send_many(
            sessions,
            SyncMessage::BlockUpdate {
                position,
                network_id: block_type.network_id(),
            },
        );
        Ok(())
    }

    /// The registered type at a position; `None` reads as air
    pub fn block_type_at(
        &self,
        dimension_id: &str,
        position: BlockPosition,
    ) -> Option<Arc<BlockType>> {
        self.dimensions
            .get(dimension_id)?
            .block_at(position)
            .map(|entry| Arc::clone(entry.block_type()))
    }

    /// Apply an effect to an entity. Re-adding an unexpired effect of
    /// the same type is a no-op and returns false.
    pub fn add_effect(
        &mut self,
        dimension_id: &str,
        runtime_id: u64,
        effect: Effect,
    ) -> SimResult<bool> {
        let dimension = self
            .dimensions
            .get_mut(dimension_id)
            .ok_or_else(|| SimError::Internal {
                message: format!("unknown dimension '{}'", dimension_id),
            })?;
        let mut entity = dimension
            .take_entity(runtime_id)
            .ok_or(SimError::EntityNotFound { runtime_id })?;
        let mut ctx = TickContext {
            current_tick: self.current_tick,
            config: &self.config,
            registries: &self.registries,
            components: &self.component_registry,
            outbound: &mut self.outbound,
        };
        let added = dispatch::add_effect(&mut entity, effect, &mut ctx);
        dimension.put_entity(entity);
        added
    }

    /// Remove an active effect, firing its removal hook
    pub fn remove_effect(
        &mut self,
        dimension_id: &str,
        runtime_id: u64,
        effect_type: crate::entity::EffectType,
    ) -> SimResult<bool> {
        let dimension = self
            .dimensions
            .get_mut(dimension_id)
            .ok_or_else(|| SimError::Internal {
                message: format!("unknown dimension '{}'", dimension_id),
            })?;
        let mut entity = dimension
            .take_entity(runtime_id)
            .ok_or(SimError::EntityNotFound { runtime_id })?;
        let mut ctx = TickContext {
            current_tick: self.current_tick,
            config: &self.config,
            registries: &self.registries,
            components: &self.component_registry,
            outbound: &mut self.outbound,
        };
        let removed = dispatch::remove_effect(&mut entity, effect_type, &mut ctx);
        dimension.put_entity(entity);
        removed
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("current_tick", &self.current_tick)
            .field("dimensions", &self.dimensions.len())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}
