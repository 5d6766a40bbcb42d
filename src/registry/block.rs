//! Block type definitions

use super::RegistryEntry;
use crate::nbt::CompoundTag;

/// Immutable description of one block kind
///
/// Hardness below zero marks the block unbreakable. Tags feed the digger
/// speed tables (`query.any_tag` selectors match against them).
#[derive(Debug, Clone)]
pub struct BlockType {
    identifier: String,
    network_id: i32,
    hardness: f32,
    tags: Vec<String>,
    drops: Option<String>,
    properties: CompoundTag,
    components: CompoundTag,
}

impl BlockType {
    pub fn new(identifier: impl Into<String>, network_id: i32, hardness: f32) -> Self {
        Self {
            identifier: identifier.into(),
            network_id,
            hardness,
            tags: Vec::new(),
            drops: None,
            properties: CompoundTag::new(),
            components: CompoundTag::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Override the item dropped on break; the default is the item sharing
    /// this block's identifier.
    pub fn with_drops(mut self, item_identifier: impl Into<String>) -> Self {
        self.drops = Some(item_identifier.into());
        self
    }

    pub fn hardness(&self) -> f32 {
        self.hardness
    }

    pub fn is_air(&self) -> bool {
        self.identifier == "minecraft:air"
    }

    pub fn is_unbreakable(&self) -> bool {
        self.hardness < 0.0
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Item identifier dropped when this block breaks
    pub fn drops(&self) -> &str {
        self.drops.as_deref().unwrap_or(&self.identifier)
    }

    pub fn properties(&self) -> &CompoundTag {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut CompoundTag {
        &mut self.properties
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

impl RegistryEntry for BlockType {
    const KIND: &'static str = "block";

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn network_id(&self) -> i32 {
        self.network_id
    }
}
