//! Containers
//!
//! Fixed-size slot arrays for inventories, armor, cursors and storage
//! blocks. Every mutation records the touched slots so the owner can
//! flush slot-level sync messages to whoever is watching.

pub mod transaction;

use std::collections::BTreeSet;

use crate::error::{SimError, SimResult};
use crate::item::ItemStack;
use crate::nbt::{CompoundTag, Tag};
use crate::registry::{ItemType, TypeRegistry};

/// Standard slot counts
pub const CHEST_SIZE: usize = 27;
pub const PLAYER_INVENTORY_SIZE: usize = 36;
pub const HOTBAR_SIZE: usize = 9;
pub const CURSOR_SIZE: usize = 1;
pub const ARMOR_SIZE: usize = 4;
pub const CRAFTING_INPUT_SIZE: usize = 4;

static_assertions::const_assert!(HOTBAR_SIZE <= PLAYER_INVENTORY_SIZE);

/// Which surface a container represents, used when routing sync messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerLabel {
    Inventory,
    Armor,
    Cursor,
    CraftingInput,
    /// The block container the player currently has open
    Opened,
    /// A container attached to a non-player entity
    Entity,
}

/// A fixed set of item slots
#[derive(Debug, Clone)]
pub struct Container {
    label: ContainerLabel,
    slots: Vec<Option<ItemStack>>,
    empty_slots: usize,
    dirty: BTreeSet<usize>,
}

impl Container {
    pub fn new(label: ContainerLabel, size: usize) -> Self {
        Self {
            label,
            slots: vec![None; size],
            empty_slots: size,
            dirty: BTreeSet::new(),
        }
    }

    pub fn label(&self) -> ContainerLabel {
        self.label
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn empty_slots_remaining(&self) -> usize {
        self.empty_slots
    }

    pub fn is_full(&self) -> bool {
        self.empty_slots == 0
    }

    pub fn is_empty(&self) -> bool {
        self.empty_slots == self.size()
    }

    fn check_slot(&self, slot: usize) -> SimResult<()> {
        if slot >= self.slots.len() {
            return Err(SimError::SlotOutOfBounds {
                slot,
                size: self.slots.len(),
            });
        }
        Ok(())
    }

    pub fn get_item(&self, slot: usize) -> SimResult<Option<&ItemStack>> {
        self.check_slot(slot)?;
        Ok(self.slots[slot].as_ref())
    }

    pub fn get_item_mut(&mut self, slot: usize) -> SimResult<Option<&mut ItemStack>> {
        self.check_slot(slot)?;
        self.dirty.insert(slot);
        Ok(self.slots[slot].as_mut())
    }

    /// Put a stack into a slot, returning whatever it displaced
    pub fn set_item(&mut self, slot: usize, stack: ItemStack) -> SimResult<Option<ItemStack>> {
        self.check_slot(slot)?;
        Ok(self.store(slot, Some(stack)))
    }

    /// Empty a slot, returning what was there
    pub fn clear_slot(&mut self, slot: usize) -> SimResult<Option<ItemStack>> {
        self.check_slot(slot)?;
        Ok(self.store(slot, None))
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        for slot in 0..self.slots.len() {
            if self.slots[slot].is_some() {
                self.store(slot, None);
            }
        }
    }

    fn store(&mut self, slot: usize, stack: Option<ItemStack>) -> Option<ItemStack> {
        let previous = self.slots[slot].take();
        match (&previous, &stack) {
            (Some(_), None) => self.empty_slots += 1,
            (None, Some(_)) => self.empty_slots -= 1,
            _ => {}
        }
        self.slots[slot] = stack;
        self.dirty.insert(slot);
        previous
    }

    /// Split `count` items out of a slot. The remainder stays behind;
    /// taking everything clears the slot.
    pub fn take_item(&mut self, slot: usize, count: i32) -> SimResult<Option<ItemStack>> {
        self.check_slot(slot)?;
        let Some(stack) = self.slots[slot].as_mut() else {
            return Ok(None);
        };
        if count <= 0 {
            return Ok(None);
        }
        let taken = stack.split(count);
        let depleted = stack.is_depleted();
        self.dirty.insert(slot);
        if depleted {
            self.store(slot, None);
        }
        Ok(taken)
    }

    /// Merge a stack into compatible occupied slots first, then the first
    /// empty slot. Anything that does not fit comes back as the remainder.
    pub fn add_item(&mut self, stack: ItemStack) -> Option<ItemStack> {
        let mut remaining = stack;

        for slot in 0..self.slots.len() {
            let Some(existing) = self.slots[slot].as_mut() else {
                continue;
            };
            if !existing.can_merge(&remaining) {
                continue;
            }
            let room = existing.room_left();
            if room <= 0 {
                continue;
            }
            let moved = room.min(remaining.amount());
            existing.set_amount(existing.amount() + moved);
            self.dirty.insert(slot);
            if moved >= remaining.amount() {
                return None;
            }
            remaining.set_amount(remaining.amount() - moved);
        }

        if let Some(slot) = self.first_empty_slot() {
            self.store(slot, Some(remaining));
            return None;
        }
        Some(remaining)
    }

    pub fn first_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Exchange the contents of two slots
    pub fn swap_items(&mut self, slot: usize, other_slot: usize) -> SimResult<()> {
        self.check_slot(slot)?;
        self.check_slot(other_slot)?;
        if slot != other_slot {
            self.slots.swap(slot, other_slot);
            self.dirty.insert(slot);
            self.dirty.insert(other_slot);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&ItemStack>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(slot, stack)| (slot, stack.as_ref()))
    }

    /// Slots touched since the last drain, in ascending order
    pub fn take_dirty(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Snapshot of every slot, for whole-content sync
    pub fn snapshot(&self) -> Vec<Option<ItemStack>> {
        self.slots.clone()
    }

    /// Serialize occupied slots as a list of per-slot entries
    pub fn to_nbt(&self) -> CompoundTag {
        let entries = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, stack)| {
                stack
                    .as_ref()
                    .map(|stack| Tag::Compound(stack.to_nbt(slot as u8)))
            })
            .collect();
        let mut root = CompoundTag::new();
        root.set_list("Items", entries);
        root
    }

    /// Restore slots from a serialized container. Entries addressing slots
    /// beyond this container's size are hard errors.
    pub fn load_nbt(
        &mut self,
        root: &CompoundTag,
        items: &TypeRegistry<ItemType>,
    ) -> SimResult<()> {
        self.clear();
        let Some(entries) = root.get_list("Items") else {
            return Ok(());
        };
        for entry in entries {
            let Tag::Compound(entry) = entry else {
                return Err(SimError::TagDecode {
                    reason: "container entry must be a compound".to_string(),
                });
            };
            let (slot, stack) = ItemStack::from_nbt(entry, items)?;
            self.set_item(slot as usize, stack)?;
        }
        Ok(())
    }
}

/// Exchange the contents of two slots across two containers
pub fn swap_between(
    first: &mut Container,
    first_slot: usize,
    second: &mut Container,
    second_slot: usize,
) -> SimResult<()> {
    first.check_slot(first_slot)?;
    second.check_slot(second_slot)?;
    let from_first = first.store(first_slot, None);
    let from_second = second.store(second_slot, None);
    if let Some(stack) = from_first {
        second.store(second_slot, Some(stack));
    }
    if let Some(stack) = from_second {
        first.store(first_slot, Some(stack));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_items() -> TypeRegistry<ItemType> {
        let mut items = TypeRegistry::new();
        items.register(ItemType::new("minecraft:dirt", 3).with_block("minecraft:dirt"));
        items.register(ItemType::new("minecraft:apple", 260));
        items.register(ItemType::new("minecraft:iron_pickaxe", 257).with_max_stack_size(1));
        items
    }

    fn stack_of(items: &TypeRegistry<ItemType>, identifier: &str, amount: i32) -> ItemStack {
        ItemStack::new(items.get(identifier).expect("registered"), amount)
    }

    #[test]
    fn test_set_get_clear_cycle() {
        let items = test_items();
        let mut chest = Container::new(ContainerLabel::Opened, CHEST_SIZE);
        assert_eq!(chest.empty_slots_remaining(), CHEST_SIZE);

        let displaced = chest
            .set_item(3, stack_of(&items, "minecraft:dirt", 10))
            .expect("in range");
        assert!(displaced.is_none());
        assert_eq!(chest.empty_slots_remaining(), CHEST_SIZE - 1);
        assert_eq!(
            chest.get_item(3).expect("in range").map(ItemStack::amount),
            Some(10)
        );

        let removed = chest.clear_slot(3).expect("in range");
        assert_eq!(removed.map(|s| s.amount()), Some(10));
        assert!(chest.is_empty());
    }

    #[test]
    fn test_out_of_range_slot_is_error() {
        let items = test_items();
        let mut cursor = Container::new(ContainerLabel::Cursor, CURSOR_SIZE);
        assert!(matches!(
            cursor.get_item(1),
            Err(SimError::SlotOutOfBounds { slot: 1, size: 1 })
        ));
        assert!(cursor
            .set_item(9, stack_of(&items, "minecraft:dirt", 1))
            .is_err());
    }

    #[test]
    fn test_add_item_merges_before_filling_empty() {
        let items = test_items();
        let mut inventory = Container::new(ContainerLabel::Inventory, PLAYER_INVENTORY_SIZE);
        inventory
            .set_item(0, stack_of(&items, "minecraft:dirt", 60))
            .expect("in range");
        inventory
            .set_item(5, stack_of(&items, "minecraft:apple", 3))
            .expect("in range");

        let remainder = inventory.add_item(stack_of(&items, "minecraft:dirt", 10));
        assert!(remainder.is_none());
        // 4 merged into slot 0, 6 into the first empty slot
        assert_eq!(
            inventory.get_item(0).expect("in range").map(ItemStack::amount),
            Some(64)
        );
        assert_eq!(
            inventory.get_item(1).expect("in range").map(ItemStack::amount),
            Some(6)
        );
    }

    #[test]
    fn test_add_item_reports_remainder_when_full() {
        let items = test_items();
        let mut cursor = Container::new(ContainerLabel::Cursor, CURSOR_SIZE);
        cursor
            .set_item(0, stack_of(&items, "minecraft:dirt", 64))
            .expect("in range");

        let remainder = cursor.add_item(stack_of(&items, "minecraft:dirt", 10));
        assert_eq!(remainder.map(|s| s.amount()), Some(10));
    }

    #[test]
    fn test_take_item_splits_and_clears() {
        let items = test_items();
        let mut chest = Container::new(ContainerLabel::Opened, CHEST_SIZE);
        chest
            .set_item(0, stack_of(&items, "minecraft:dirt", 10))
            .expect("in range");

        let taken = chest.take_item(0, 4).expect("in range");
        assert_eq!(taken.map(|s| s.amount()), Some(4));
        assert_eq!(
            chest.get_item(0).expect("in range").map(ItemStack::amount),
            Some(6)
        );

        let rest = chest.take_item(0, 100).expect("in range");
        assert_eq!(rest.map(|s| s.amount()), Some(6));
        assert!(chest.get_item(0).expect("in range").is_none());
        assert_eq!(chest.empty_slots_remaining(), CHEST_SIZE);
    }

    #[test]
    fn test_swap_within_and_between_containers() {
        let items = test_items();
        let mut inventory = Container::new(ContainerLabel::Inventory, PLAYER_INVENTORY_SIZE);
        inventory
            .set_item(0, stack_of(&items, "minecraft:dirt", 5))
            .expect("in range");
        inventory
            .set_item(1, stack_of(&items, "minecraft:apple", 2))
            .expect("in range");
        inventory.swap_items(0, 1).expect("in range");
        assert_eq!(
            inventory
                .get_item(0)
                .expect("in range")
                .map(ItemStack::identifier),
            Some("minecraft:apple")
        );

        let mut chest = Container::new(ContainerLabel::Opened, CHEST_SIZE);
        swap_between(&mut inventory, 0, &mut chest, 10).expect("in range");
        assert!(inventory.get_item(0).expect("in range").is_none());
        assert_eq!(
            chest
                .get_item(10)
                .expect("in range")
                .map(ItemStack::identifier),
            Some("minecraft:apple")
        );
        assert_eq!(chest.empty_slots_remaining(), CHEST_SIZE - 1);
        assert_eq!(
            inventory.empty_slots_remaining(),
            PLAYER_INVENTORY_SIZE - 1
        );
    }

    #[test]
    fn test_dirty_slots_drain_in_order() {
        let items = test_items();
        let mut chest = Container::new(ContainerLabel::Opened, CHEST_SIZE);
        chest
            .set_item(7, stack_of(&items, "minecraft:dirt", 1))
            .expect("in range");
        chest
            .set_item(2, stack_of(&items, "minecraft:apple", 1))
            .expect("in range");
        assert_eq!(chest.take_dirty(), vec![2, 7]);
        assert!(!chest.has_dirty());
    }

    #[test]
    fn test_nbt_roundtrip() {
        let items = test_items();
        let mut chest = Container::new(ContainerLabel::Opened, CHEST_SIZE);
        chest
            .set_item(0, stack_of(&items, "minecraft:dirt", 12))
            .expect("in range");
        let mut pickaxe = stack_of(&items, "minecraft:iron_pickaxe", 1);
        pickaxe.extra_mut().set_int("Damage", 40);
        chest.set_item(26, pickaxe).expect("in range");

        let encoded = chest.to_nbt();
        let mut restored = Container::new(ContainerLabel::Opened, CHEST_SIZE);
        restored.load_nbt(&encoded, &items).expect("well formed");

        assert_eq!(
            restored
                .get_item(0)
                .expect("in range")
                .map(ItemStack::amount),
            Some(12)
        );
        assert_eq!(
            restored
                .get_item(26)
                .expect("in range")
                .and_then(|s| s.extra())
                .and_then(|t| t.get_int("Damage")),
            Some(40)
        );
        assert_eq!(restored.empty_slots_remaining(), CHEST_SIZE - 2);
    }

    #[test]
    fn test_load_rejects_out_of_range_entry() {
        let items = test_items();
        let mut cursor = Container::new(ContainerLabel::Cursor, CURSOR_SIZE);
        let mut big = Container::new(ContainerLabel::Opened, CHEST_SIZE);
        big.set_item(20, stack_of(&items, "minecraft:dirt", 1))
            .expect("in range");
        let encoded = big.to_nbt();
        assert!(cursor.load_nbt(&encoded, &items).is_err());
    }
}
