//! Built-in item components
//!
//! These are instantiated per dispatch from the type's binding list;
//! anything that must outlive a single use (durability damage, the
//! eat timer) lives in the stack's extra data or on the player. Each
//! constructor parses its definition out of the item type's component
//! tree and refuses types that do not carry it.

use std::any::Any;

use rand::Rng;

use crate::component::player::HungerComponent;
use crate::component::{ActorFlag, AttributeKind, Component, ItemComponent, UseCause, UseMethod};
use crate::entity::{Entity, UsingItem};
use crate::error::{SimError, SimResult};
use crate::item::{
    BlockPlacerDefinition, DurabilityDefinition, FoodDefinition, ItemStack, WearableDefinition,
};
use crate::position::BlockPosition;
use crate::registry::{ItemType, RegistryEntry};
use crate::world::TickContext;

/// Ticks of held use before food finishes, with slack for tick skew
const EAT_DURATION_TICKS: u64 = 24;

fn missing_definition(item_type: &ItemType, identifier: &str) -> SimError {
    SimError::ComponentState {
        identifier: identifier.to_string(),
        reason: format!("{} carries no such definition", item_type.identifier()),
    }
}

/// Wear tracking for tools and armor.
///
/// Damage accumulates in the stack's extra data; the definition's
/// damage chance decides whether a given use wears the item at all.
#[derive(Debug)]
pub struct DurabilityComponent {
    definition: DurabilityDefinition,
}

impl DurabilityComponent {
    pub const IDENTIFIER: &'static str = DurabilityDefinition::IDENTIFIER;

    pub fn try_new(item_type: &ItemType) -> SimResult<Self> {
        let definition = DurabilityDefinition::from_components(item_type.components())?
            .ok_or_else(|| missing_definition(item_type, Self::IDENTIFIER))?;
        Ok(Self { definition })
    }

    pub fn current_damage(stack: &ItemStack) -> i32 {
        stack
            .extra()
            .and_then(|extra| extra.get_int("Damage"))
            .unwrap_or(0)
    }

    /// Apply one use worth of wear. Reports true when the item breaks.
    ///
    /// Without an unbreaking enchantment the damage chance collapses to
    /// the definition's maximum.
    pub fn damage(&self, stack: &mut ItemStack) -> bool {
        let chance = self.definition.damage_chance_max.clamp(0, 100);
        if rand::thread_rng().gen_range(0..100) >= chance {
            return false;
        }
        let worn = Self::current_damage(stack) + 1;
        stack.extra_mut().set_int("Damage", worn);
        worn >= self.definition.max_durability
    }

    pub fn max_durability(&self) -> i32 {
        self.definition.max_durability
    }
}

impl Component for DurabilityComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ItemComponent for DurabilityComponent {}

/// Edible behavior: a held-use timer followed by nutrition payout.
///
/// The first use begins eating; a use arriving after the timer ran out
/// consumes the food, feeds the hunger attributes and hands over any
/// conversion remainder (stew bowls).
#[derive(Debug)]
pub struct FoodComponent {
    definition: FoodDefinition,
}

impl FoodComponent {
    pub const IDENTIFIER: &'static str = FoodDefinition::IDENTIFIER;

    pub fn try_new(item_type: &ItemType) -> SimResult<Self> {
        let definition = FoodDefinition::from_components(item_type.components())?
            .ok_or_else(|| missing_definition(item_type, Self::IDENTIFIER))?;
        Ok(Self { definition })
    }

    fn begin_use(&self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
        if let Some(data) = entity.player.as_mut() {
            data.using_item = Some(UsingItem {
                started_tick: ctx.current_tick,
                slot: data.selected_slot(),
            });
        }
        entity.flags.set(ActorFlag::UsingItem, true);
        Ok(())
    }

    fn finish_use(
        &self,
        stack: &mut ItemStack,
        entity: &mut Entity,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<()> {
        let nutrition = self.definition.nutrition as f32;
        let saturation = nutrition * self.definition.saturation_modifier * 2.0;
        HungerComponent::feed(&mut entity.attributes, nutrition, saturation)?;
        entity.flags.set(ActorFlag::UsingItem, false);

        let Some(data) = entity.player.as_mut() else {
            return Ok(());
        };
        data.using_item = None;
        if data.gamemode.is_creative() {
            return Ok(());
        }
        let _ = stack.split(1);
        if let Some(converts_to) = &self.definition.using_converts_to {
            let item_type = ctx.registries.items.get(converts_to).ok_or_else(|| {
                SimError::UnknownType {
                    kind: "item",
                    identifier: converts_to.clone(),
                }
            })?;
            if let Some(leftover) = data.inventory.add_item(ItemStack::new(item_type, 1)) {
                log::debug!(
                    "No room for {} after eating, discarding",
                    leftover.identifier()
                );
            }
        }
        Ok(())
    }
}

impl Component for FoodComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ItemComponent for FoodComponent {
    fn on_use(
        &mut self,
        stack: &mut ItemStack,
        player: &mut Entity,
        _cause: UseCause,
        _clicked: Option<BlockPosition>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<Option<UseMethod>> {
        let using = player.player.as_ref().and_then(|data| data.using_item);
        let selected = player
            .player
            .as_ref()
            .map(|data| data.selected_slot())
            .unwrap_or(0);
        match using {
            None => {
                if !self.definition.can_always_eat {
                    let full = player
                        .attributes
                        .get(AttributeKind::Hunger)
                        .map(|entry| entry.current_value() >= entry.effective_max())
                        .unwrap_or(false);
                    if full {
                        return Ok(None);
                    }
                }
                self.begin_use(player, ctx)?;
                Ok(None)
            }
            Some(using) if using.slot != selected => {
                // Hand switched mid-use; restart the timer
                self.begin_use(player, ctx)?;
                Ok(None)
            }
            Some(using) => {
                let elapsed = ctx.current_tick.saturating_sub(using.started_tick);
                if elapsed < EAT_DURATION_TICKS {
                    return Ok(None);
                }
                self.finish_use(stack, player, ctx)?;
                Ok(Some(UseMethod::Eat))
            }
        }
    }

    fn on_release(
        &mut self,
        _stack: &mut ItemStack,
        player: &mut Entity,
        _ctx: &mut TickContext<'_>,
    ) -> SimResult<()> {
        if let Some(data) = player.player.as_mut() {
            data.using_item = None;
        }
        player.flags.set(ActorFlag::UsingItem, false);
        Ok(())
    }
}

/// Reports block placement for block items; the world validates the
/// target and performs the placement itself.
#[derive(Debug)]
pub struct BlockPlacerComponent {
    definition: BlockPlacerDefinition,
}

impl BlockPlacerComponent {
    pub const IDENTIFIER: &'static str = BlockPlacerDefinition::IDENTIFIER;

    pub fn try_new(item_type: &ItemType) -> SimResult<Self> {
        let definition = BlockPlacerDefinition::from_components(item_type.components())?
            .ok_or_else(|| missing_definition(item_type, Self::IDENTIFIER))?;
        Ok(Self { definition })
    }

    pub fn definition(&self) -> &BlockPlacerDefinition {
        &self.definition
    }
}

impl Component for BlockPlacerComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ItemComponent for BlockPlacerComponent {
    fn on_use(
        &mut self,
        _stack: &mut ItemStack,
        _player: &mut Entity,
        _cause: UseCause,
        clicked: Option<BlockPosition>,
        _ctx: &mut TickContext<'_>,
    ) -> SimResult<Option<UseMethod>> {
        Ok(clicked.map(|_| UseMethod::Place))
    }
}

/// Moves the held armor piece into its armor slot on use, swapping out
/// whatever was worn there.
#[derive(Debug)]
pub struct WearableComponent {
    definition: WearableDefinition,
}

impl WearableComponent {
    pub const IDENTIFIER: &'static str = WearableDefinition::IDENTIFIER;

    pub fn try_new(item_type: &ItemType) -> SimResult<Self> {
        let definition = WearableDefinition::from_components(item_type.components())?
            .ok_or_else(|| missing_definition(item_type, Self::IDENTIFIER))?;
        Ok(Self { definition })
    }
}

impl Component for WearableComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ItemComponent for WearableComponent {
    fn on_use(
        &mut self,
        stack: &mut ItemStack,
        player: &mut Entity,
        _cause: UseCause,
        _clicked: Option<BlockPosition>,
        _ctx: &mut TickContext<'_>,
    ) -> SimResult<Option<UseMethod>> {
        let Some(data) = player.player.as_mut() else {
            return Ok(None);
        };
        let Some(equipped) = stack.split(stack.amount()) else {
            return Ok(None);
        };
        let index = self.definition.slot.armor_index();
        let previous = data.armor.set_item(index, equipped)?;
        if let Some(previous) = previous {
            // The held slot is detached during dispatch, so the swapped
            // piece can take its place directly
            data.inventory
                .set_item(data.selected_slot() as usize, previous)?;
        }
        Ok(Some(UseMethod::EquipArmor))
    }
}

/// Rebuild the stack's remaining durability for display purposes
pub fn remaining_durability(stack: &ItemStack) -> SimResult<Option<i32>> {
    let Some(definition) = DurabilityDefinition::from_components(stack.item_type().components())?
    else {
        return Ok(None);
    };
    Ok(Some(
        definition.max_durability - DurabilityComponent::current_damage(stack),
    ))
}
