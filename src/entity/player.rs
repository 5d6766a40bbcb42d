//! Player-specific state
//!
//! A player is an entity with an attached session and the client-facing
//! inventory surfaces. Gamemode and abilities gate the interaction
//! paths; abilities resync as a full set whenever one changes.

use rustc_hash::FxHashMap;

use crate::container::transaction::ContainerViews;
use crate::container::{
    Container, ContainerLabel, ARMOR_SIZE, CRAFTING_INPUT_SIZE, CURSOR_SIZE, HOTBAR_SIZE,
    PLAYER_INVENTORY_SIZE,
};
use crate::error::{SimError, SimResult};
use crate::item::ItemStack;
use crate::network::SessionId;
use crate::position::BlockPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gamemode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl Gamemode {
    pub fn id(&self) -> i32 {
        match self {
            Gamemode::Survival => 0,
            Gamemode::Creative => 1,
            Gamemode::Adventure => 2,
            Gamemode::Spectator => 6,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Gamemode::Survival),
            1 => Some(Gamemode::Creative),
            2 => Some(Gamemode::Adventure),
            6 => Some(Gamemode::Spectator),
            _ => None,
        }
    }

    pub fn is_creative(&self) -> bool {
        matches!(self, Gamemode::Creative)
    }

    /// Whether this mode may place blocks at all
    pub fn can_build(&self) -> bool {
        matches!(self, Gamemode::Survival | Gamemode::Creative)
    }

    /// Whether this mode may break blocks at all
    pub fn can_break(&self) -> bool {
        matches!(self, Gamemode::Survival | Gamemode::Creative)
    }

    /// Whether this mode may interact with blocks and entities
    pub fn can_interact(&self) -> bool {
        !matches!(self, Gamemode::Spectator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbilityKind {
    Build,
    Mine,
    DoorsAndSwitches,
    OpenContainers,
    AttackPlayers,
    AttackMobs,
    OperatorCommands,
    Teleport,
    MayFly,
    Flying,
}

impl AbilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbilityKind::Build => "build",
            AbilityKind::Mine => "mine",
            AbilityKind::DoorsAndSwitches => "doors_and_switches",
            AbilityKind::OpenContainers => "open_containers",
            AbilityKind::AttackPlayers => "attack_players",
            AbilityKind::AttackMobs => "attack_mobs",
            AbilityKind::OperatorCommands => "operator_commands",
            AbilityKind::Teleport => "teleport",
            AbilityKind::MayFly => "may_fly",
            AbilityKind::Flying => "flying",
        }
    }
}

/// Insertion-ordered ability switches with a full-set dirty marker
#[derive(Debug, Default)]
pub struct AbilityMap {
    entries: Vec<(AbilityKind, bool)>,
    index: FxHashMap<AbilityKind, usize>,
    dirty: bool,
}

impl AbilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The starting switch set for a gamemode
    pub fn for_gamemode(gamemode: Gamemode) -> Self {
        let mut abilities = Self::new();
        let acting = gamemode.can_interact();
        abilities.set(AbilityKind::Build, gamemode.can_build());
        abilities.set(AbilityKind::Mine, gamemode.can_break());
        abilities.set(AbilityKind::DoorsAndSwitches, acting);
        abilities.set(AbilityKind::OpenContainers, acting);
        abilities.set(AbilityKind::AttackPlayers, acting);
        abilities.set(AbilityKind::AttackMobs, acting);
        abilities.set(AbilityKind::OperatorCommands, false);
        abilities.set(AbilityKind::Teleport, false);
        abilities.set(
            AbilityKind::MayFly,
            matches!(gamemode, Gamemode::Creative | Gamemode::Spectator),
        );
        abilities.set(AbilityKind::Flying, matches!(gamemode, Gamemode::Spectator));
        abilities.dirty = false;
        abilities
    }

    pub fn get(&self, kind: AbilityKind) -> bool {
        self.index
            .get(&kind)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(false)
    }

    pub fn set(&mut self, kind: AbilityKind, value: bool) {
        match self.index.get(&kind) {
            Some(&slot) => {
                if self.entries[slot].1 != value {
                    self.entries[slot].1 = value;
                    self.dirty = true;
                }
            }
            None => {
                self.index.insert(kind, self.entries.len());
                self.entries.push((kind, value));
                self.dirty = true;
            }
        }
    }

    pub fn snapshot(&self) -> Vec<(AbilityKind, bool)> {
        self.entries.clone()
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// A block container the player currently has open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedContainer {
    pub window: u8,
    pub position: BlockPosition,
}

/// In-progress item use, started by the client and resolved on release
/// or completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsingItem {
    pub started_tick: u64,
    pub slot: u8,
}

#[derive(Debug)]
pub struct PlayerData {
    session: SessionId,
    username: String,
    pub gamemode: Gamemode,
    pub abilities: AbilityMap,
    selected_slot: u8,
    pub inventory: Container,
    pub cursor: Container,
    pub armor: Container,
    pub crafting_input: Container,
    pub opened: Option<OpenedContainer>,
    pub using_item: Option<UsingItem>,
    next_window: u8,
}

impl PlayerData {
    pub fn new(session: SessionId, username: impl Into<String>) -> Self {
        let gamemode = Gamemode::Survival;
        Self {
            session,
            username: username.into(),
            gamemode,
            abilities: AbilityMap::for_gamemode(gamemode),
            selected_slot: 0,
            inventory: Container::new(ContainerLabel::Inventory, PLAYER_INVENTORY_SIZE),
            cursor: Container::new(ContainerLabel::Cursor, CURSOR_SIZE),
            armor: Container::new(ContainerLabel::Armor, ARMOR_SIZE),
            crafting_input: Container::new(ContainerLabel::CraftingInput, CRAFTING_INPUT_SIZE),
            opened: None,
            using_item: None,
            next_window: 1,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn selected_slot(&self) -> u8 {
        self.selected_slot
    }

    /// Hotbar selection; slots past the hotbar are a client fault
    pub fn select_slot(&mut self, slot: u8) -> SimResult<()> {
        if slot as usize >= HOTBAR_SIZE {
            return Err(SimError::ProtocolViolation {
                message: format!("selected hotbar slot {} out of range", slot),
            });
        }
        self.selected_slot = slot;
        Ok(())
    }

    /// The stack under the hotbar selection.
    ///
    /// The selection is bounds-checked on write, so the lookup cannot
    /// actually fail.
    pub fn held_item(&self) -> Option<&ItemStack> {
        self.inventory
            .get_item(self.selected_slot as usize)
            .unwrap_or(None)
    }

    pub fn held_item_mut(&mut self) -> Option<&mut ItemStack> {
        self.inventory
            .get_item_mut(self.selected_slot as usize)
            .unwrap_or(None)
    }

    /// Remove `count` from the held stack, as survival consumption does
    pub fn shrink_held(&mut self, count: i32) -> SimResult<()> {
        let slot = self.selected_slot as usize;
        self.inventory.take_item(slot, count)?;
        Ok(())
    }

    /// Allocate a window id and mark the block container open
    pub fn open_window(&mut self, position: BlockPosition) -> u8 {
        let window = self.next_window;
        self.next_window = if self.next_window >= 99 {
            1
        } else {
            self.next_window + 1
        };
        self.opened = Some(OpenedContainer { window, position });
        window
    }

    pub fn close_window(&mut self) -> Option<OpenedContainer> {
        self.opened.take()
    }

    /// The mutable container surfaces a stack-request batch may touch
    pub fn container_views<'a>(
        &'a mut self,
        opened: Option<&'a mut Container>,
    ) -> ContainerViews<'a> {
        ContainerViews {
            cursor: &mut self.cursor,
            inventory: &mut self.inventory,
            armor: &mut self.armor,
            crafting_input: &mut self.crafting_input,
            opened,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerData {
        PlayerData::new(SessionId::new(7), "Steve")
    }

    #[test]
    fn test_slot_selection_is_bounds_checked() {
        let mut data = player();
        assert!(data.select_slot(8).is_ok());
        assert_eq!(data.selected_slot(), 8);
        assert!(data.select_slot(9).is_err());
        assert_eq!(data.selected_slot(), 8);
    }

    #[test]
    fn test_window_ids_cycle() {
        let mut data = player();
        let origin = BlockPosition::new(0, 64, 0);
        let first = data.open_window(origin);
        assert_eq!(first, 1);
        data.close_window();
        let second = data.open_window(origin);
        assert_eq!(second, 2);
        assert!(data.opened.is_some());
    }

    #[test]
    fn test_creative_defaults_allow_flight() {
        let abilities = AbilityMap::for_gamemode(Gamemode::Creative);
        assert!(abilities.get(AbilityKind::MayFly));
        assert!(!abilities.get(AbilityKind::Flying));
        assert!(abilities.get(AbilityKind::Build));
        assert!(!abilities.get(AbilityKind::OperatorCommands));
    }

    #[test]
    fn test_spectator_defaults_deny_building() {
        let abilities = AbilityMap::for_gamemode(Gamemode::Spectator);
        assert!(!abilities.get(AbilityKind::Build));
        assert!(!abilities.get(AbilityKind::Mine));
        assert!(abilities.get(AbilityKind::Flying));
    }

    #[test]
    fn test_ability_changes_mark_dirty() {
        let mut abilities = AbilityMap::for_gamemode(Gamemode::Survival);
        assert!(!abilities.take_dirty());
        abilities.set(AbilityKind::MayFly, true);
        assert!(abilities.take_dirty());
        abilities.set(AbilityKind::MayFly, true);
        assert!(!abilities.take_dirty());
    }
}
