//! Type-level item component definitions
//!
//! Each definition lives under its namespaced key in an item type's
//! components compound. Accessors parse on demand and reject malformed
//! entries instead of coercing them; writers rebuild the subtree so a
//! changed template applies to every stack created afterwards.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{SimError, SimResult};
use crate::nbt::{CompoundTag, Tag};
use crate::registry::{BlockType, RegistryEntry};

/// Armor slot addressed by wearable items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentSlot {
    Head,
    Chest,
    Legs,
    Feet,
}

impl EquipmentSlot {
    /// Index into the four-slot armor container
    pub fn armor_index(&self) -> usize {
        match self {
            EquipmentSlot::Head => 0,
            EquipmentSlot::Chest => 1,
            EquipmentSlot::Legs => 2,
            EquipmentSlot::Feet => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentSlot::Head => "slot.armor.head",
            EquipmentSlot::Chest => "slot.armor.chest",
            EquipmentSlot::Legs => "slot.armor.legs",
            EquipmentSlot::Feet => "slot.armor.feet",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "slot.armor.head" => Some(EquipmentSlot::Head),
            "slot.armor.chest" => Some(EquipmentSlot::Chest),
            "slot.armor.legs" => Some(EquipmentSlot::Legs),
            "slot.armor.feet" => Some(EquipmentSlot::Feet),
            _ => None,
        }
    }
}

/// Selects the blocks a destroy-speed entry applies to
#[derive(Debug, Clone, PartialEq)]
pub enum BlockSelector {
    /// A single block identifier
    Name(String),
    /// Any block carrying one of these tags
    AnyTag(Vec<String>),
}

impl BlockSelector {
    pub fn matches(&self, block: &BlockType) -> bool {
        match self {
            BlockSelector::Name(name) => block.identifier() == name,
            BlockSelector::AnyTag(tags) => tags.iter().any(|tag| block.has_tag(tag)),
        }
    }
}

/// One row of a digger speed table
#[derive(Debug, Clone, PartialEq)]
pub struct DestroySpeed {
    pub speed: i32,
    pub selector: BlockSelector,
}

/// Tool behavior: how fast this item breaks which blocks
#[derive(Debug, Clone, PartialEq)]
pub struct DiggerDefinition {
    pub use_efficiency: bool,
    pub destroy_speeds: Vec<DestroySpeed>,
}

fn any_tag_query() -> Option<&'static Regex> {
    static QUERY: OnceLock<Option<Regex>> = OnceLock::new();
    QUERY
        .get_or_init(|| Regex::new(r"(?:q|query)\.any_tag\(\s*(.*?)\s*\)").ok())
        .as_ref()
}

fn parse_any_tag(query: &str) -> Option<Vec<String>> {
    let captures = any_tag_query()?.captures(query)?;
    let inner = captures.get(1)?.as_str();
    let tags = inner
        .split(',')
        .map(|part| part.trim().trim_matches('\'').trim_matches('"').to_string())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>();
    Some(tags)
}

impl DiggerDefinition {
    pub const IDENTIFIER: &'static str = "minecraft:digger";

    /// Destroy speed against the given block, if any entry selects it
    pub fn speed_against(&self, block: &BlockType) -> Option<i32> {
        self.destroy_speeds
            .iter()
            .find(|entry| entry.selector.matches(block))
            .map(|entry| entry.speed)
    }

    pub fn to_tag(&self) -> CompoundTag {
        let mut root = CompoundTag::new();
        root.set_byte("use_efficiency", self.use_efficiency as i8);
        let speeds = self
            .destroy_speeds
            .iter()
            .map(|entry| {
                let mut row = CompoundTag::new();
                row.set_int("speed", entry.speed);
                let mut block = CompoundTag::new();
                match &entry.selector {
                    BlockSelector::Name(name) => block.set_string("name", name.clone()),
                    BlockSelector::AnyTag(tags) => {
                        let quoted = tags
                            .iter()
                            .map(|tag| format!("'{}'", tag))
                            .collect::<Vec<_>>()
                            .join(", ");
                        block.set_string("tags", format!("query.any_tag({})", quoted));
                    }
                }
                row.set_compound("block", block);
                Tag::Compound(row)
            })
            .collect();
        root.set_list("destroy_speeds", speeds);
        root
    }

    pub fn apply(&self, components: &mut CompoundTag) {
        components.insert(Self::IDENTIFIER, Tag::Compound(self.to_tag()));
    }

    pub fn from_components(components: &CompoundTag) -> SimResult<Option<Self>> {
        let Some(root) = components.get_compound(Self::IDENTIFIER) else {
            return Ok(None);
        };
        let use_efficiency = root.get_byte("use_efficiency").unwrap_or(0) != 0;
        let mut destroy_speeds = Vec::new();
        for row in root.require_list("destroy_speeds")? {
            let Tag::Compound(row) = row else {
                return Err(malformed(Self::IDENTIFIER, "destroy_speeds row"));
            };
            let speed = row.require_int("speed")?;
            let block = row.require_compound("block")?;
            let selector = if let Some(name) = block.get_string("name") {
                BlockSelector::Name(name.to_string())
            } else if let Some(query) = block.get_string("tags") {
                let tags = parse_any_tag(query)
                    .ok_or_else(|| malformed(Self::IDENTIFIER, "tag query"))?;
                BlockSelector::AnyTag(tags)
            } else {
                return Err(malformed(Self::IDENTIFIER, "block selector"));
            };
            destroy_speeds.push(DestroySpeed { speed, selector });
        }
        Ok(Some(Self {
            use_efficiency,
            destroy_speeds,
        }))
    }
}

/// Durability template: maximum wear and the chance to take damage per use
#[derive(Debug, Clone, PartialEq)]
pub struct DurabilityDefinition {
    pub max_durability: i32,
    pub damage_chance_min: i32,
    pub damage_chance_max: i32,
}

impl DurabilityDefinition {
    pub const IDENTIFIER: &'static str = "minecraft:durability";

    pub fn to_tag(&self) -> CompoundTag {
        let mut root = CompoundTag::new();
        root.set_int("max_durability", self.max_durability);
        let mut chance = CompoundTag::new();
        chance.set_int("min", self.damage_chance_min);
        chance.set_int("max", self.damage_chance_max);
        root.set_compound("damage_chance", chance);
        root
    }

    pub fn apply(&self, components: &mut CompoundTag) {
        components.insert(Self::IDENTIFIER, Tag::Compound(self.to_tag()));
    }

    pub fn from_components(components: &CompoundTag) -> SimResult<Option<Self>> {
        let Some(root) = components.get_compound(Self::IDENTIFIER) else {
            return Ok(None);
        };
        let max_durability = root.require_int("max_durability")?;
        if max_durability <= 0 {
            return Err(malformed(Self::IDENTIFIER, "max_durability must be positive"));
        }
        let chance = root.require_compound("damage_chance")?;
        Ok(Some(Self {
            max_durability,
            damage_chance_min: chance.get_int("min").unwrap_or(100),
            damage_chance_max: chance.get_int("max").unwrap_or(100),
        }))
    }
}

/// Food template consumed through the use lifecycle
#[derive(Debug, Clone, PartialEq)]
pub struct FoodDefinition {
    pub nutrition: i32,
    pub saturation_modifier: f32,
    pub can_always_eat: bool,
    pub using_converts_to: Option<String>,
}

impl FoodDefinition {
    pub const IDENTIFIER: &'static str = "minecraft:food";

    pub fn to_tag(&self) -> CompoundTag {
        let mut root = CompoundTag::new();
        root.set_int("nutrition", self.nutrition);
        root.set_float("saturation_modifier", self.saturation_modifier);
        root.set_byte("can_always_eat", self.can_always_eat as i8);
        if let Some(converts) = &self.using_converts_to {
            root.set_string("using_converts_to", converts.clone());
        }
        root
    }

    pub fn apply(&self, components: &mut CompoundTag) {
        components.insert(Self::IDENTIFIER, Tag::Compound(self.to_tag()));
    }

    pub fn from_components(components: &CompoundTag) -> SimResult<Option<Self>> {
        let Some(root) = components.get_compound(Self::IDENTIFIER) else {
            return Ok(None);
        };
        Ok(Some(Self {
            nutrition: root.require_int("nutrition")?,
            saturation_modifier: root.get_float("saturation_modifier").unwrap_or(0.6),
            can_always_eat: root.get_byte("can_always_eat").unwrap_or(0) != 0,
            using_converts_to: root.get_string("using_converts_to").map(str::to_string),
        }))
    }
}

/// Wearable template: the armor slot this item occupies
#[derive(Debug, Clone, PartialEq)]
pub struct WearableDefinition {
    pub slot: EquipmentSlot,
    pub protection: i32,
}

impl WearableDefinition {
    pub const IDENTIFIER: &'static str = "minecraft:wearable";

    pub fn to_tag(&self) -> CompoundTag {
        let mut root = CompoundTag::new();
        root.set_string("slot", self.slot.as_str());
        root.set_int("protection", self.protection);
        root
    }

    pub fn apply(&self, components: &mut CompoundTag) {
        components.insert(Self::IDENTIFIER, Tag::Compound(self.to_tag()));
    }

    pub fn from_components(components: &CompoundTag) -> SimResult<Option<Self>> {
        let Some(root) = components.get_compound(Self::IDENTIFIER) else {
            return Ok(None);
        };
        let slot_name = root.require_string("slot")?;
        let slot = EquipmentSlot::from_str(slot_name)
            .ok_or_else(|| malformed(Self::IDENTIFIER, "unknown armor slot"))?;
        Ok(Some(Self {
            slot,
            protection: root.get_int("protection").unwrap_or(0),
        }))
    }
}

/// Block-placer template: which block a use action places
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPlacerDefinition {
    pub block_identifier: String,
    /// Block identifiers this item may be used on; empty means anywhere
    pub use_on: Vec<String>,
}

impl BlockPlacerDefinition {
    pub const IDENTIFIER: &'static str = "minecraft:block_placer";

    pub fn can_use_on(&self, block: &BlockType) -> bool {
        self.use_on.is_empty() || self.use_on.iter().any(|id| id == block.identifier())
    }

    pub fn to_tag(&self) -> CompoundTag {
        let mut root = CompoundTag::new();
        root.set_string("block", self.block_identifier.clone());
        if !self.use_on.is_empty() {
            let entries = self
                .use_on
                .iter()
                .map(|id| Tag::String(id.clone()))
                .collect();
            root.set_list("use_on", entries);
        }
        root
    }

    pub fn apply(&self, components: &mut CompoundTag) {
        components.insert(Self::IDENTIFIER, Tag::Compound(self.to_tag()));
    }

    pub fn from_components(components: &CompoundTag) -> SimResult<Option<Self>> {
        let Some(root) = components.get_compound(Self::IDENTIFIER) else {
            return Ok(None);
        };
        let block_identifier = root.require_string("block")?.to_string();
        let mut use_on = Vec::new();
        if let Some(entries) = root.get_list("use_on") {
            for entry in entries {
                match entry {
                    Tag::String(id) => use_on.push(id.clone()),
                    _ => return Err(malformed(Self::IDENTIFIER, "use_on entry")),
                }
            }
        }
        Ok(Some(Self {
            block_identifier,
            use_on,
        }))
    }
}

/// Fixed display name shown instead of the translated identifier
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNameDefinition {
    pub value: String,
}

impl DisplayNameDefinition {
    pub const IDENTIFIER: &'static str = "minecraft:display_name";

    pub fn to_tag(&self) -> CompoundTag {
        let mut root = CompoundTag::new();
        root.set_string("value", self.value.clone());
        root
    }

    pub fn apply(&self, components: &mut CompoundTag) {
        components.insert(Self::IDENTIFIER, Tag::Compound(self.to_tag()));
    }

    pub fn from_components(components: &CompoundTag) -> SimResult<Option<Self>> {
        let Some(root) = components.get_compound(Self::IDENTIFIER) else {
            return Ok(None);
        };
        Ok(Some(Self {
            value: root.require_string("value")?.to_string(),
        }))
    }
}

fn malformed(identifier: &str, reason: &str) -> SimError {
    SimError::MalformedDefinition {
        identifier: identifier.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digger_roundtrip_and_speed_lookup() {
        let definition = DiggerDefinition {
            use_efficiency: true,
            destroy_speeds: vec![
                DestroySpeed {
                    speed: 6,
                    selector: BlockSelector::AnyTag(vec![
                        "stone".to_string(),
                        "metal".to_string(),
                    ]),
                },
                DestroySpeed {
                    speed: 2,
                    selector: BlockSelector::Name("minecraft:glass".to_string()),
                },
            ],
        };

        let mut components = CompoundTag::new();
        definition.apply(&mut components);
        let parsed = DiggerDefinition::from_components(&components)
            .expect("well formed")
            .expect("present");
        assert_eq!(parsed, definition);

        let stone = BlockType::new("minecraft:stone", 1, 1.5).with_tags(&["stone"]);
        let glass = BlockType::new("minecraft:glass", 20, 0.3);
        let dirt = BlockType::new("minecraft:dirt", 3, 0.5).with_tags(&["dirt"]);
        assert_eq!(parsed.speed_against(&stone), Some(6));
        assert_eq!(parsed.speed_against(&glass), Some(2));
        assert_eq!(parsed.speed_against(&dirt), None);
    }

    #[test]
    fn test_tag_query_parsing() {
        assert_eq!(
            parse_any_tag("query.any_tag('wood', 'pumpkin')"),
            Some(vec!["wood".to_string(), "pumpkin".to_string()])
        );
        assert_eq!(
            parse_any_tag("q.any_tag('dirt')"),
            Some(vec!["dirt".to_string()])
        );
        assert_eq!(parse_any_tag("hardness > 1"), None);
    }

    #[test]
    fn test_absent_definition_reads_as_none() {
        let components = CompoundTag::new();
        assert!(DiggerDefinition::from_components(&components)
            .expect("ok")
            .is_none());
        assert!(FoodDefinition::from_components(&components)
            .expect("ok")
            .is_none());
    }

    #[test]
    fn test_malformed_durability_rejected() {
        let definition = DurabilityDefinition {
            max_durability: 250,
            damage_chance_min: 60,
            damage_chance_max: 100,
        };
        let mut components = CompoundTag::new();
        definition.apply(&mut components);
        let parsed = DurabilityDefinition::from_components(&components)
            .expect("ok")
            .expect("present");
        assert_eq!(parsed, definition);

        // break the subtree: wrong type under max_durability
        let root = components
            .get_compound_mut(DurabilityDefinition::IDENTIFIER)
            .expect("present");
        root.set_string("max_durability", "lots");
        assert!(DurabilityDefinition::from_components(&components).is_err());
    }

    #[test]
    fn test_wearable_slot_names() {
        let definition = WearableDefinition {
            slot: EquipmentSlot::Chest,
            protection: 6,
        };
        let mut components = CompoundTag::new();
        definition.apply(&mut components);
        let parsed = WearableDefinition::from_components(&components)
            .expect("ok")
            .expect("present");
        assert_eq!(parsed.slot, EquipmentSlot::Chest);
        assert_eq!(parsed.slot.armor_index(), 1);
    }

    #[test]
    fn test_block_placer_use_on_filter() {
        let definition = BlockPlacerDefinition {
            block_identifier: "minecraft:dirt".to_string(),
            use_on: vec!["minecraft:grass".to_string()],
        };
        let grass = BlockType::new("minecraft:grass", 2, 0.6);
        let stone = BlockType::new("minecraft:stone", 1, 1.5);
        assert!(definition.can_use_on(&grass));
        assert!(!definition.can_use_on(&stone));

        let anywhere = BlockPlacerDefinition {
            block_identifier: "minecraft:dirt".to_string(),
            use_on: Vec::new(),
        };
        assert!(anywhere.can_use_on(&stone));
    }

    #[test]
    fn test_template_change_applies_to_future_reads() {
        let mut components = CompoundTag::new();
        DisplayNameDefinition {
            value: "Iron Pickaxe".to_string(),
        }
        .apply(&mut components);
        DisplayNameDefinition {
            value: "Improved Iron Pickaxe".to_string(),
        }
        .apply(&mut components);
        let parsed = DisplayNameDefinition::from_components(&components)
            .expect("ok")
            .expect("present");
        assert_eq!(parsed.value, "Improved Iron Pickaxe");
    }
}
