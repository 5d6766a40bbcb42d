//! Live entities
//!
//! An entity is the unit of simulation: position and motion, the
//! attribute/metadata/flag maps every component and interaction path
//! mutates, a component set instantiated from its type's bindings, and
//! optional container and player extensions. Entities are owned by their
//! dimension's registry and addressed by runtime id.

pub mod effect;
pub mod player;

pub use effect::{Effect, EffectType};
pub use player::{AbilityKind, AbilityMap, Gamemode, OpenedContainer, PlayerData, UsingItem};

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::Vec3;

use crate::component::{
    AttributeMap, ComponentKind, ComponentSet, EntityComponent, FlagMap, MetadataMap,
};
use crate::container::Container;
use crate::nbt::CompoundTag;
use crate::network::SessionId;
use crate::registry::{EntityType, RegistryEntry};

/// Yaw and pitch in degrees, matching the client's look convention
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub yaw: f32,
    pub pitch: f32,
    pub head_yaw: f32,
}

impl Rotation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw,
            pitch,
            head_yaw: yaw,
        }
    }
}

pub struct Entity {
    runtime_id: u64,
    unique_id: i64,
    entity_type: Arc<EntityType>,
    pub position: Vec3,
    pub rotation: Rotation,
    pub velocity: Vec3,
    pub attributes: AttributeMap,
    pub metadata: MetadataMap,
    pub flags: FlagMap,
    pub components: ComponentSet<dyn EntityComponent>,
    /// Persistent extra state carried across despawn/spawn
    pub storage: CompoundTag,
    pub container: Option<Container>,
    pub player: Option<PlayerData>,
    /// Sessions currently shown this entity
    pub observers: BTreeSet<SessionId>,
    pub pending_despawn: bool,
}

impl Entity {
    pub fn new(entity_type: Arc<EntityType>, runtime_id: u64, unique_id: i64, position: Vec3) -> Self {
        Self {
            runtime_id,
            unique_id,
            entity_type,
            position,
            rotation: Rotation::default(),
            velocity: Vec3::ZERO,
            attributes: AttributeMap::new(),
            metadata: MetadataMap::new(),
            flags: FlagMap::new(),
            components: ComponentSet::new(),
            storage: CompoundTag::new(),
            container: None,
            player: None,
            observers: BTreeSet::new(),
            pending_despawn: false,
        }
    }

    pub fn runtime_id(&self) -> u64 {
        self.runtime_id
    }

    pub fn unique_id(&self) -> i64 {
        self.unique_id
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    pub fn identifier(&self) -> &str {
        self.entity_type.identifier()
    }

    pub fn is_player(&self) -> bool {
        self.player.is_some()
    }

    pub fn session(&self) -> Option<SessionId> {
        self.player.as_ref().map(PlayerData::session)
    }

    /// Chunk column containing this entity
    pub fn chunk(&self) -> (i32, i32) {
        (
            (self.position.x.floor() as i32) >> 4,
            (self.position.z.floor() as i32) >> 4,
        )
    }

    pub fn distance_squared(&self, other: &Entity) -> f32 {
        self.position.distance_squared(other.position)
    }

    /// Unit vector the entity is looking along
    pub fn look_direction(&self) -> Vec3 {
        let yaw = self.rotation.yaw.to_radians();
        let pitch = self.rotation.pitch.to_radians();
        Vec3::new(
            -pitch.cos() * yaw.sin(),
            -pitch.sin(),
            pitch.cos() * yaw.cos(),
        )
    }

    /// Flag the entity for removal at the end of the current tick
    pub fn despawn(&mut self) {
        self.pending_despawn = true;
    }

    /// Unregister a component and evict the map entry it wrapped
    pub fn remove_component(&mut self, identifier: &str) -> Option<Box<dyn EntityComponent>> {
        let component = self.components.remove(identifier)?;
        match component.kind() {
            ComponentKind::Attribute(kind) => {
                self.attributes.remove(kind);
            }
            ComponentKind::Metadata(key) => {
                self.metadata.remove(key);
            }
            ComponentKind::Flag(flag) => self.flags.set(flag, false),
            ComponentKind::Generic => {}
        }
        Some(component)
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("runtime_id", &self.runtime_id)
            .field("identifier", &self.identifier())
            .field("position", &self.position)
            .field("player", &self.player.as_ref().map(PlayerData::username))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pig() -> Entity {
        let entity_type = Arc::new(EntityType::new("minecraft:pig", 12));
        Entity::new(entity_type, 1, 1001, Vec3::new(8.5, 64.0, -24.5))
    }

    #[test]
    fn test_chunk_uses_floored_coordinates() {
        let entity = pig();
        assert_eq!(entity.chunk(), (0, -2));
    }

    #[test]
    fn test_non_player_has_no_session() {
        let entity = pig();
        assert!(!entity.is_player());
        assert!(entity.session().is_none());
    }

    #[test]
    fn test_look_direction_is_normalized() {
        let mut entity = pig();
        entity.rotation = Rotation::new(90.0, 0.0);
        let direction = entity.look_direction();
        assert!((direction.length() - 1.0).abs() < 1e-5);
        assert!(direction.x < -0.99);
    }
}
