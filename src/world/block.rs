//! Blocks placed in the world
//!
//! The block store is sparse: only positions that were explicitly set
//! carry an entry, everything else reads as air. An entry owns its
//! component set and, for container blocks, the container itself.

use std::sync::Arc;

use crate::component::{BlockComponent, ComponentSet};
use crate::container::Container;
use crate::nbt::CompoundTag;
use crate::position::BlockPosition;
use crate::registry::{BlockType, RegistryEntry};

pub struct BlockEntry {
    position: BlockPosition,
    block_type: Arc<BlockType>,
    /// Persistent per-block state (container contents live here across
    /// save/load)
    pub storage: CompoundTag,
    pub components: ComponentSet<dyn BlockComponent>,
    pub container: Option<Container>,
}

impl BlockEntry {
    pub fn new(position: BlockPosition, block_type: Arc<BlockType>) -> Self {
        Self {
            position,
            block_type,
            storage: CompoundTag::new(),
            components: ComponentSet::new(),
            container: None,
        }
    }

    pub fn position(&self) -> BlockPosition {
        self.position
    }

    pub fn block_type(&self) -> &Arc<BlockType> {
        &self.block_type
    }

    pub fn identifier(&self) -> &str {
        self.block_type.identifier()
    }

    pub fn network_id(&self) -> i32 {
        self.block_type.network_id()
    }
}

impl std::fmt::Debug for BlockEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockEntry")
            .field("position", &self.position)
            .field("identifier", &self.identifier())
            .field("container", &self.container.is_some())
            .finish()
    }
}
