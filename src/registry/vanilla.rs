//! Vanilla palette bootstrap
//!
//! The starter block/item/entity types ship as an embedded JSON table and
//! register through the same write-once path custom types use.

use serde::Deserialize;

use super::{BlockType, EntityType, ItemType, TypeRegistry};
use crate::error::{SimError, SimResult};
use crate::item::components::{
    BlockPlacerDefinition, BlockSelector, DestroySpeed, DiggerDefinition, DisplayNameDefinition,
    DurabilityDefinition, EquipmentSlot, FoodDefinition, WearableDefinition,
};

const VANILLA_DEFINITIONS: &str = include_str!("vanilla.json");

/// The three type registries backing one world
pub struct Registries {
    pub blocks: TypeRegistry<BlockType>,
    pub items: TypeRegistry<ItemType>,
    pub entities: TypeRegistry<EntityType>,
}

impl Registries {
    /// Registries with nothing in them, for tests and custom bootstraps
    pub fn empty() -> Self {
        Self {
            blocks: TypeRegistry::new(),
            items: TypeRegistry::new(),
            entities: TypeRegistry::new(),
        }
    }

    /// Registries pre-loaded with the embedded vanilla palette
    pub fn vanilla() -> SimResult<Self> {
        let set: VanillaSet =
            serde_json::from_str(VANILLA_DEFINITIONS).map_err(|e| SimError::MalformedDefinition {
                identifier: "vanilla".to_string(),
                reason: e.to_string(),
            })?;

        let mut registries = Self::empty();
        for def in set.blocks {
            registries.blocks.register(def.into_type());
        }
        for def in set.items {
            registries.items.register(def.into_type()?);
        }
        for def in set.entities {
            registries
                .entities
                .register(EntityType::new(def.identifier, def.network_id));
        }

        log::info!(
            "Vanilla palette ready: {} blocks, {} items, {} entities",
            registries.blocks.len(),
            registries.items.len(),
            registries.entities.len()
        );
        Ok(registries)
    }
}

#[derive(Deserialize)]
struct VanillaSet {
    blocks: Vec<VanillaBlock>,
    items: Vec<VanillaItem>,
    entities: Vec<VanillaEntity>,
}

#[derive(Deserialize)]
struct VanillaBlock {
    identifier: String,
    network_id: i32,
    hardness: f32,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    drops: Option<String>,
}

impl VanillaBlock {
    fn into_type(self) -> BlockType {
        let mut block = BlockType::new(self.identifier, self.network_id, self.hardness);
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        block = block.with_tags(&tags);
        if let Some(drops) = self.drops {
            block = block.with_drops(drops);
        }
        block
    }
}

#[derive(Deserialize)]
struct VanillaItem {
    identifier: String,
    network_id: i32,
    #[serde(default)]
    max_stack_size: Option<i32>,
    #[serde(default)]
    block: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    durability: Option<VanillaDurability>,
    #[serde(default)]
    digger: Option<VanillaDigger>,
    #[serde(default)]
    food: Option<VanillaFood>,
    #[serde(default)]
    wearable: Option<VanillaWearable>,
    #[serde(default)]
    display_name: Option<String>,
}

impl VanillaItem {
    fn into_type(self) -> SimResult<ItemType> {
        let mut item = ItemType::new(self.identifier.clone(), self.network_id);
        if let Some(max) = self.max_stack_size {
            item = item.with_max_stack_size(max);
        }
        if let Some(block) = &self.block {
            item = item.with_block(block.clone());
        }
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        item = item.with_tags(&tags);

        let components = item.components_mut();
        if let Some(block) = self.block {
            // Block items place their linked block; an empty filter
            // allows placement against any target
            BlockPlacerDefinition {
                block_identifier: block,
                use_on: Vec::new(),
            }
            .apply(components);
        }
        if let Some(durability) = self.durability {
            DurabilityDefinition {
                max_durability: durability.max_durability,
                damage_chance_min: durability.damage_chance_min,
                damage_chance_max: durability.damage_chance_max,
            }
            .apply(components);
        }
        if let Some(digger) = self.digger {
            digger.into_definition(&self.identifier)?.apply(components);
        }
        if let Some(food) = self.food {
            FoodDefinition {
                nutrition: food.nutrition,
                saturation_modifier: food.saturation_modifier,
                can_always_eat: food.can_always_eat,
                using_converts_to: food.using_converts_to,
            }
            .apply(components);
        }
        if let Some(wearable) = self.wearable {
            WearableDefinition {
                slot: wearable.slot(&self.identifier)?,
                protection: wearable.protection,
            }
            .apply(components);
        }
        if let Some(value) = self.display_name {
            DisplayNameDefinition { value }.apply(components);
        }
        Ok(item)
    }
}

#[derive(Deserialize)]
struct VanillaDurability {
    max_durability: i32,
    #[serde(default = "default_damage_chance")]
    damage_chance_min: i32,
    #[serde(default = "default_damage_chance")]
    damage_chance_max: i32,
}

fn default_damage_chance() -> i32 {
    100
}

#[derive(Deserialize)]
struct VanillaDigger {
    #[serde(default)]
    use_efficiency: bool,
    destroy_speeds: Vec<VanillaSpeed>,
}

#[derive(Deserialize)]
struct VanillaSpeed {
    speed: i32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl VanillaDigger {
    fn into_definition(self, item: &str) -> SimResult<DiggerDefinition> {
        let mut destroy_speeds = Vec::with_capacity(self.destroy_speeds.len());
        for row in self.destroy_speeds {
            let selector = match (row.name, row.tags) {
                (Some(name), _) => BlockSelector::Name(name),
                (None, tags) if !tags.is_empty() => BlockSelector::AnyTag(tags),
                _ => {
                    return Err(SimError::MalformedDefinition {
                        identifier: item.to_string(),
                        reason: "destroy speed without a block selector".to_string(),
                    })
                }
            };
            destroy_speeds.push(DestroySpeed {
                speed: row.speed,
                selector,
            });
        }
        Ok(DiggerDefinition {
            use_efficiency: self.use_efficiency,
            destroy_speeds,
        })
    }
}

#[derive(Deserialize)]
struct VanillaFood {
    nutrition: i32,
    #[serde(default = "default_saturation")]
    saturation_modifier: f32,
    #[serde(default)]
    can_always_eat: bool,
    #[serde(default)]
    using_converts_to: Option<String>,
}

fn default_saturation() -> f32 {
    0.6
}

#[derive(Deserialize)]
struct VanillaWearable {
    slot: String,
    #[serde(default)]
    protection: i32,
}

impl VanillaWearable {
    fn slot(&self, item: &str) -> SimResult<EquipmentSlot> {
        match self.slot.as_str() {
            "head" => Ok(EquipmentSlot::Head),
            "chest" => Ok(EquipmentSlot::Chest),
            "legs" => Ok(EquipmentSlot::Legs),
            "feet" => Ok(EquipmentSlot::Feet),
            other => Err(SimError::MalformedDefinition {
                identifier: item.to_string(),
                reason: format!("unknown armor slot '{}'", other),
            }),
        }
    }
}

#[derive(Deserialize)]
struct VanillaEntity {
    identifier: String,
    network_id: i32,
}
