//! Item stacks and type-level item component definitions

pub mod components;
mod stack;

pub use components::{
    BlockPlacerDefinition, BlockSelector, DestroySpeed, DiggerDefinition, DisplayNameDefinition,
    DurabilityDefinition, EquipmentSlot, FoodDefinition, WearableDefinition,
};
pub use stack::ItemStack;
