//! Vanilla component bindings
//!
//! Wires the built-in components to the vanilla type palette. Living
//! entities share the survival set, players add the hunger and
//! container-sync components on top, and item bindings are derived by
//! scanning each item type for the definitions it actually carries.

use super::block::{BreakableComponent, ChestComponent};
use super::entity::{
    BreathingComponent, EffectsComponent, HealthComponent, InventoryComponent, ItemEntityComponent,
    MovementComponent, NametagComponent, OnFireComponent, VisibilityComponent,
};
use super::item::{BlockPlacerComponent, DurabilityComponent, FoodComponent, WearableComponent};
use super::player::{
    CraftingInputComponent, CursorComponent, EquipmentComponent, HungerComponent,
};
use super::registry::ComponentRegistry;
use super::{BlockComponent, EntityComponent, ItemComponent};
use crate::error::SimResult;
use crate::item::{
    BlockPlacerDefinition, DurabilityDefinition, FoodDefinition, WearableDefinition,
};
use crate::registry::{BlockType, EntityType, ItemType, Registries, RegistryEntry};

fn health(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(HealthComponent::default()))
}

fn movement(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(MovementComponent::default()))
}

fn effects(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(EffectsComponent::new()))
}

fn nametag(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(NametagComponent::default()))
}

fn visibility(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(VisibilityComponent::default()))
}

fn on_fire(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(OnFireComponent::default()))
}

fn breathing(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(BreathingComponent::default()))
}

fn inventory(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(InventoryComponent::default()))
}

fn item_entity(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(ItemEntityComponent::new()))
}

fn hunger(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(HungerComponent::default()))
}

fn cursor(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(CursorComponent::default()))
}

fn crafting_input(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(CraftingInputComponent::default()))
}

fn equipment(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
    Ok(Box::new(EquipmentComponent::default()))
}

fn chest(block_type: &BlockType) -> SimResult<Box<dyn BlockComponent>> {
    Ok(Box::new(ChestComponent::try_new(block_type)?))
}

fn breakable(_: &BlockType) -> SimResult<Box<dyn BlockComponent>> {
    Ok(Box::new(BreakableComponent::default()))
}

fn durability(item_type: &ItemType) -> SimResult<Box<dyn ItemComponent>> {
    Ok(Box::new(DurabilityComponent::try_new(item_type)?))
}

fn food(item_type: &ItemType) -> SimResult<Box<dyn ItemComponent>> {
    Ok(Box::new(FoodComponent::try_new(item_type)?))
}

fn block_placer(item_type: &ItemType) -> SimResult<Box<dyn ItemComponent>> {
    Ok(Box::new(BlockPlacerComponent::try_new(item_type)?))
}

fn wearable(item_type: &ItemType) -> SimResult<Box<dyn ItemComponent>> {
    Ok(Box::new(WearableComponent::try_new(item_type)?))
}

/// Entity types that run the survival loop. The item entity is not
/// among them; it carries only its pickup component.
const LIVING_TYPES: &[&str] = &[
    "minecraft:player",
    "minecraft:zombie",
    "minecraft:skeleton",
    "minecraft:cow",
    "minecraft:pig",
];

const PLAYER_ONLY: &[&str] = &["minecraft:player"];

/// Item types whose component tree carries a given definition
fn items_carrying(registries: &Registries, probe: fn(&ItemType) -> bool) -> Vec<String> {
    registries
        .items
        .all()
        .iter()
        .filter(|item| probe(item))
        .map(|item| item.identifier().to_string())
        .collect()
}

/// Bind the built-in components against the vanilla palette
pub fn vanilla_bindings(registries: &Registries) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();

    registry
        .entity
        .bind(HealthComponent::IDENTIFIER, health, LIVING_TYPES);
    registry
        .entity
        .bind(MovementComponent::IDENTIFIER, movement, LIVING_TYPES);
    registry
        .entity
        .bind(EffectsComponent::IDENTIFIER, effects, LIVING_TYPES);
    registry
        .entity
        .bind(NametagComponent::IDENTIFIER, nametag, LIVING_TYPES);
    registry
        .entity
        .bind(VisibilityComponent::IDENTIFIER, visibility, LIVING_TYPES);
    registry
        .entity
        .bind(OnFireComponent::IDENTIFIER, on_fire, LIVING_TYPES);
    registry
        .entity
        .bind(BreathingComponent::IDENTIFIER, breathing, LIVING_TYPES);
    registry
        .entity
        .bind(InventoryComponent::IDENTIFIER, inventory, PLAYER_ONLY);
    registry
        .entity
        .bind(HungerComponent::IDENTIFIER, hunger, PLAYER_ONLY);
    registry
        .entity
        .bind(CursorComponent::IDENTIFIER, cursor, PLAYER_ONLY);
    registry.entity.bind(
        CraftingInputComponent::IDENTIFIER,
        crafting_input,
        PLAYER_ONLY,
    );
    registry
        .entity
        .bind(EquipmentComponent::IDENTIFIER, equipment, PLAYER_ONLY);
    registry.entity.bind(
        ItemEntityComponent::IDENTIFIER,
        item_entity,
        &["minecraft:item"],
    );

    registry
        .block
        .bind(ChestComponent::IDENTIFIER, chest, &["minecraft:chest"]);
    let breakable_blocks: Vec<String> = registries
        .blocks
        .all()
        .iter()
        .filter(|block| !block.is_air())
        .map(|block| block.identifier().to_string())
        .collect();
    let breakable_refs: Vec<&str> = breakable_blocks.iter().map(String::as_str).collect();
    registry
        .block
        .bind(BreakableComponent::IDENTIFIER, breakable, &breakable_refs);

    let durable = items_carrying(registries, |item| {
        matches!(
            DurabilityDefinition::from_components(item.components()),
            Ok(Some(_))
        )
    });
    let durable_refs: Vec<&str> = durable.iter().map(String::as_str).collect();
    registry
        .item
        .bind(DurabilityComponent::IDENTIFIER, durability, &durable_refs);

    let edible = items_carrying(registries, |item| {
        matches!(FoodDefinition::from_components(item.components()), Ok(Some(_)))
    });
    let edible_refs: Vec<&str> = edible.iter().map(String::as_str).collect();
    registry
        .item
        .bind(FoodComponent::IDENTIFIER, food, &edible_refs);

    let placers = items_carrying(registries, |item| {
        matches!(
            BlockPlacerDefinition::from_components(item.components()),
            Ok(Some(_))
        )
    });
    let placer_refs: Vec<&str> = placers.iter().map(String::as_str).collect();
    registry
        .item
        .bind(BlockPlacerComponent::IDENTIFIER, block_placer, &placer_refs);

    let wearables = items_carrying(registries, |item| {
        matches!(
            WearableDefinition::from_components(item.components()),
            Ok(Some(_))
        )
    });
    let wearable_refs: Vec<&str> = wearables.iter().map(String::as_str).collect();
    registry
        .item
        .bind(WearableComponent::IDENTIFIER, wearable, &wearable_refs);

    log::info!(
        "Vanilla bindings ready: {} entity, {} block, {} item component(s)",
        registry.entity.len(),
        registry.block.len(),
        registry.item.len()
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bootstrap() -> (Registries, ComponentRegistry) {
        let registries = Registries::vanilla().expect("vanilla registries");
        let components = vanilla_bindings(&registries);
        (registries, components)
    }

    #[test]
    fn test_player_gets_survival_and_player_components() {
        let (registries, components) = bootstrap();
        let player_type = registries.entities.get("minecraft:player").expect("player");
        let set = components
            .instantiate_entity(&player_type)
            .expect("player set");
        assert!(set.has(HealthComponent::IDENTIFIER));
        assert!(set.has(HungerComponent::IDENTIFIER));
        assert!(set.has(EffectsComponent::IDENTIFIER));
        assert!(set.has(InventoryComponent::IDENTIFIER));
    }

    #[test]
    fn test_item_entity_skips_survival_set() {
        let (registries, components) = bootstrap();
        let item_type = registries.entities.get("minecraft:item").expect("item");
        let set = components.instantiate_entity(&item_type).expect("item set");
        assert!(set.has(ItemEntityComponent::IDENTIFIER));
        assert!(!set.has(HealthComponent::IDENTIFIER));
        assert!(!set.has(HungerComponent::IDENTIFIER));
    }

    #[test]
    fn test_zombie_skips_player_components() {
        let (registries, components) = bootstrap();
        let zombie_type = registries.entities.get("minecraft:zombie").expect("zombie");
        let set = components
            .instantiate_entity(&zombie_type)
            .expect("zombie set");
        assert!(set.has(HealthComponent::IDENTIFIER));
        assert!(!set.has(HungerComponent::IDENTIFIER));
        assert!(!set.has(CursorComponent::IDENTIFIER));
    }

    #[test]
    fn test_chest_block_gets_container_component() {
        let (registries, components) = bootstrap();
        let chest_type = registries.blocks.get("minecraft:chest").expect("chest");
        let set = components.instantiate_block(&chest_type).expect("chest set");
        assert!(set.has(ChestComponent::IDENTIFIER));
        assert!(set.has(BreakableComponent::IDENTIFIER));
    }

    #[test]
    fn test_air_is_never_breakable() {
        let (_, components) = bootstrap();
        assert!(components.block.bound_to("minecraft:air").is_empty());
    }

    #[test]
    fn test_item_bindings_follow_definitions() {
        let (registries, components) = bootstrap();
        let pickaxe = registries
            .items
            .get("minecraft:iron_pickaxe")
            .expect("pickaxe");
        let list = components.instantiate_item(&pickaxe).expect("pickaxe list");
        assert_eq!(list.len(), 1);

        let apple = registries.items.get("minecraft:apple").expect("apple");
        let list = components.instantiate_item(&apple).expect("apple list");
        assert_eq!(list.len(), 1);

        let dirt = registries.items.get("minecraft:dirt").expect("dirt");
        let list = components.instantiate_item(&dirt).expect("dirt list");
        assert_eq!(list.len(), 1);

        let stick = registries.items.get("minecraft:stick").expect("stick");
        assert!(components
            .instantiate_item(&stick)
            .expect("stick list")
            .is_empty());
    }
}
