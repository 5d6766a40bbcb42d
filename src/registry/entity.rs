//! Entity type definitions

use super::RegistryEntry;
use crate::nbt::CompoundTag;

/// Immutable description of one entity kind
#[derive(Debug, Clone)]
pub struct EntityType {
    identifier: String,
    network_id: i32,
    properties: CompoundTag,
    components: CompoundTag,
}

impl EntityType {
    pub fn new(identifier: impl Into<String>, network_id: i32) -> Self {
        Self {
            identifier: identifier.into(),
            network_id,
            properties: CompoundTag::new(),
            components: CompoundTag::new(),
        }
    }

    pub fn properties(&self) -> &CompoundTag {
        &self.properties
    }

    /// Type-level component definitions
    pub fn components(&self) -> &CompoundTag {
        &self.components
    }

    /// Mutable before registration freezes the type behind an Arc
    pub fn components_mut(&mut self) -> &mut CompoundTag {
        &mut self.components
    }
}

impl RegistryEntry for EntityType {
    const KIND: &'static str = "entity";

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn network_id(&self) -> i32 {
        self.network_id
    }
}
