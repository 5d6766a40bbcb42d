//! Item type definitions

use super::RegistryEntry;
use crate::nbt::CompoundTag;

/// Default stack limit when a type declares none
pub const DEFAULT_MAX_STACK: i32 = 64;

/// Immutable description of one item kind
///
/// Behavior definitions (digger speeds, durability, food values and the
/// rest) live in the `components` compound and are read through the typed
/// accessors in `item::components`.
#[derive(Debug, Clone)]
pub struct ItemType {
    identifier: String,
    network_id: i32,
    block: Option<String>,
    tags: Vec<String>,
    properties: CompoundTag,
    components: CompoundTag,
}

impl ItemType {
    pub fn new(identifier: impl Into<String>, network_id: i32) -> Self {
        Self {
            identifier: identifier.into(),
            network_id,
            block: None,
            tags: Vec::new(),
            properties: CompoundTag::new(),
            components: CompoundTag::new(),
        }
    }

    /// Link the block this item places
    pub fn with_block(mut self, block_identifier: impl Into<String>) -> Self {
        self.block = Some(block_identifier.into());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_max_stack_size(mut self, max: i32) -> Self {
        self.components
            .set_byte("minecraft:max_stack_size", max.clamp(1, i8::MAX as i32) as i8);
        self
    }

    /// Largest amount one stack of this type may hold
    pub fn max_stack_size(&self) -> i32 {
        self.components
            .get_byte("minecraft:max_stack_size")
            .map(|v| v as i32)
            .unwrap_or(DEFAULT_MAX_STACK)
    }

    pub fn is_stackable(&self) -> bool {
        self.max_stack_size() > 1
    }

    /// Identifier of the linked block, if this is a block item
    pub fn block_identifier(&self) -> Option<&str> {
        self.block.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
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

impl RegistryEntry for ItemType {
    const KIND: &'static str = "item";

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn network_id(&self) -> i32 {
        self.network_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_stack_defaults_to_64() {
        let apple = ItemType::new("minecraft:apple", 260);
        assert_eq!(apple.max_stack_size(), DEFAULT_MAX_STACK);
        assert!(apple.is_stackable());
    }

    #[test]
    fn test_max_stack_override() {
        let pickaxe = ItemType::new("minecraft:iron_pickaxe", 257).with_max_stack_size(1);
        assert_eq!(pickaxe.max_stack_size(), 1);
        assert!(!pickaxe.is_stackable());
    }

    #[test]
    fn test_block_link() {
        let dirt = ItemType::new("minecraft:dirt", 3).with_block("minecraft:dirt");
        assert_eq!(dirt.block_identifier(), Some("minecraft:dirt"));
        assert_eq!(ItemType::new("minecraft:stick", 280).block_identifier(), None);
    }
}
