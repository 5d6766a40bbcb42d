//! Item stacks
//!
//! A stack references its shared type, carries an amount within the type's
//! stack limit, a metadata value, and an optional extra-data compound for
//! display names, enchantments and durability damage.

use std::sync::Arc;

use crate::error::{SimError, SimResult};
use crate::nbt::{CompoundTag, Tag};
use crate::registry::{ItemType, RegistryEntry, TypeRegistry};

#[derive(Debug, Clone)]
pub struct ItemStack {
    item_type: Arc<ItemType>,
    amount: i32,
    metadata: i32,
    extra: Option<CompoundTag>,
}

impl ItemStack {
    /// Build a stack, clamping the amount into `1..=max_stack_size`
    pub fn new(item_type: Arc<ItemType>, amount: i32) -> Self {
        let max = item_type.max_stack_size();
        Self {
            item_type,
            amount: amount.clamp(1, max),
            metadata: 0,
            extra: None,
        }
    }

    pub fn with_metadata(mut self, metadata: i32) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn item_type(&self) -> &Arc<ItemType> {
        &self.item_type
    }

    pub fn identifier(&self) -> &str {
        self.item_type.identifier()
    }

    pub fn network_id(&self) -> i32 {
        self.item_type.network_id()
    }

    pub fn amount(&self) -> i32 {
        self.amount
    }

    /// Clamp into the stack limit; callers clear the slot instead of
    /// setting zero
    pub fn set_amount(&mut self, amount: i32) {
        self.amount = amount.clamp(1, self.max_stack_size());
    }

    pub fn max_stack_size(&self) -> i32 {
        self.item_type.max_stack_size()
    }

    /// Free capacity left in this stack
    pub fn room_left(&self) -> i32 {
        self.max_stack_size() - self.amount
    }

    pub fn metadata(&self) -> i32 {
        self.metadata
    }

    pub fn extra(&self) -> Option<&CompoundTag> {
        self.extra.as_ref()
    }

    /// Extra-data compound, created on first write
    pub fn extra_mut(&mut self) -> &mut CompoundTag {
        self.extra.get_or_insert_with(CompoundTag::new)
    }

    pub fn set_extra(&mut self, extra: Option<CompoundTag>) {
        self.extra = match extra {
            Some(tag) if tag.is_empty() => None,
            other => other,
        };
    }

    /// Merge-equality: same type, same metadata, same extra data. The
    /// amount headroom check stays with the container doing the merge.
    pub fn can_merge(&self, other: &ItemStack) -> bool {
        self.item_type.is_stackable()
            && self.identifier() == other.identifier()
            && self.metadata == other.metadata
            && self.normalized_extra() == other.normalized_extra()
    }

    fn normalized_extra(&self) -> Option<&CompoundTag> {
        self.extra.as_ref().filter(|tag| !tag.is_empty())
    }

    /// Split `count` off this stack into a new stack, leaving the rest.
    /// Returns None when nothing can be split.
    pub fn split(&mut self, count: i32) -> Option<ItemStack> {
        if count <= 0 {
            return None;
        }
        let taken = count.min(self.amount);
        let mut piece = self.clone();
        piece.amount = taken;
        self.amount -= taken;
        Some(piece)
    }

    /// Whether split() consumed the whole stack
    pub fn is_depleted(&self) -> bool {
        self.amount <= 0
    }

    /// Serialize into a per-slot compound entry
    pub fn to_nbt(&self, slot: u8) -> CompoundTag {
        let mut entry = CompoundTag::new();
        entry.set_byte("Slot", slot as i8);
        entry.set_string("Name", self.identifier());
        entry.set_byte("Count", self.amount.clamp(1, i8::MAX as i32) as i8);
        entry.set_short("Damage", self.metadata.clamp(0, i16::MAX as i32) as i16);
        if let Some(extra) = self.normalized_extra() {
            entry.set_compound("tag", extra.clone());
        }
        entry
    }

    /// Rebuild a stack from a per-slot compound entry. Unknown identifiers
    /// are configuration errors.
    pub fn from_nbt(
        entry: &CompoundTag,
        items: &TypeRegistry<ItemType>,
    ) -> SimResult<(u8, ItemStack)> {
        let slot = entry.require_byte("Slot")? as u8;
        let name = entry.require_string("Name")?;
        let item_type = items.get(name).ok_or_else(|| SimError::UnknownType {
            kind: "item",
            identifier: name.to_string(),
        })?;
        let amount = entry.require_byte("Count")? as i32;
        let metadata = entry.get_short("Damage").unwrap_or(0) as i32;
        let mut stack = ItemStack::new(item_type, amount).with_metadata(metadata);
        if let Some(Tag::Compound(extra)) = entry.get("tag") {
            stack.set_extra(Some(extra.clone()));
        }
        Ok((slot, stack))
    }
}
