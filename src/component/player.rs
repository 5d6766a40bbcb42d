//! Player-only components
//!
//! Hunger metabolism plus the per-tick sync of the player-private
//! container surfaces (cursor, armor, crafting grid). These bind to the
//! player type; their tick hooks quietly skip entities whose player data
//! has not been attached yet.

use std::any::Any;

use crate::component::{AttributeKind, Attribute, AttributeMap, Component, ComponentKind, EntityComponent};
use crate::entity::Entity;
use crate::error::SimResult;
use crate::network::{
    SyncMessage, UI_CRAFTING_INPUT_FIRST_SLOT, UI_CURSOR_SLOT, WINDOW_ARMOR, WINDOW_UI,
};
use crate::world::TickContext;

/// Exhaustion spent before one point of saturation or hunger drains
const EXHAUSTION_THRESHOLD: f32 = 4.0;
/// Upper bound on banked exhaustion
const EXHAUSTION_MAX: f32 = 40.0;
/// Ticks between natural regeneration / starvation pulses
const METABOLISM_INTERVAL: u64 = 80;
/// Exhaustion charged for one point of natural regeneration
const REGENERATION_EXHAUSTION: f32 = 6.0;

/// Hunger, saturation and exhaustion, with the metabolism that ties
/// them to health.
///
/// Exhaustion banks up from activity; every four points drains one
/// point of saturation, or of hunger once saturation is gone. A full
/// stomach heals, an empty one starves the player down to half a heart.
#[derive(Debug, Default)]
pub struct HungerComponent;

impl HungerComponent {
    pub const IDENTIFIER: &'static str = "minecraft:player.hunger";

    /// Add food points, capping saturation at the resulting hunger level
    pub fn feed(attributes: &mut AttributeMap, nutrition: f32, saturation: f32) -> SimResult<()> {
        let hunger_after = match attributes.get(AttributeKind::Hunger) {
            Some(entry) => {
                let fed = (entry.current_value() + nutrition).min(entry.effective_max());
                attributes.set_current_value(AttributeKind::Hunger, fed)?
            }
            None => return Ok(()),
        };
        if let Some(entry) = attributes.get(AttributeKind::Saturation) {
            let fed = (entry.current_value() + saturation)
                .min(entry.effective_max())
                .min(hunger_after);
            attributes.set_current_value(AttributeKind::Saturation, fed)?;
        }
        Ok(())
    }

    /// Bank exhaustion from an activity
    pub fn add_exhaustion(attributes: &mut AttributeMap, amount: f32) -> SimResult<()> {
        if let Some(entry) = attributes.get(AttributeKind::Exhaustion) {
            let banked = (entry.current_value() + amount).min(EXHAUSTION_MAX);
            attributes.set_current_value(AttributeKind::Exhaustion, banked)?;
        }
        Ok(())
    }
}

impl Component for HungerComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Attribute(AttributeKind::Hunger)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EntityComponent for HungerComponent {
    fn on_spawn(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        entity
            .attributes
            .apply(Attribute::new(AttributeKind::Hunger, 0.0, 20.0, 20.0));
        entity
            .attributes
            .apply(Attribute::new(AttributeKind::Saturation, 0.0, 20.0, 5.0));
        entity.attributes.apply(Attribute::new(
            AttributeKind::Exhaustion,
            0.0,
            EXHAUSTION_MAX,
            0.0,
        ));
        Ok(())
    }

    fn on_tick(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let Some(mut hunger) = entity.attributes.current_value(AttributeKind::Hunger) else {
            return Ok(());
        };
        let mut saturation = entity
            .attributes
            .current_value(AttributeKind::Saturation)
            .unwrap_or(0.0);
        let mut exhaustion = entity
            .attributes
            .current_value(AttributeKind::Exhaustion)
            .unwrap_or(0.0);

        let mut drained = false;
        while exhaustion >= EXHAUSTION_THRESHOLD {
            exhaustion -= EXHAUSTION_THRESHOLD;
            if saturation > 0.0 {
                saturation = (saturation - 1.0).max(0.0);
            } else {
                hunger = (hunger - 1.0).max(0.0);
            }
            drained = true;
        }
        if drained {
            entity
                .attributes
                .set_current_value(AttributeKind::Hunger, hunger)?;
            entity
                .attributes
                .set_current_value(AttributeKind::Saturation, saturation)?;
            entity
                .attributes
                .set_current_value(AttributeKind::Exhaustion, exhaustion)?;
        }

        if ctx.current_tick % METABOLISM_INTERVAL != 0 {
            return Ok(());
        }
        let Some(health_entry) = entity.attributes.get(AttributeKind::Health) else {
            return Ok(());
        };
        let health = health_entry.current_value();
        let health_max = health_entry.effective_max();
        if hunger >= 18.0 && health < health_max {
            entity
                .attributes
                .set_current_value(AttributeKind::Health, (health + 1.0).min(health_max))?;
            Self::add_exhaustion(&mut entity.attributes, REGENERATION_EXHAUSTION)?;
        } else if hunger <= 0.0 && health > 1.0 {
            entity
                .attributes
                .set_current_value(AttributeKind::Health, (health - 1.0).max(1.0))?;
        }
        Ok(())
    }
}

/// Streams cursor slot changes to the owning client
#[derive(Debug, Default)]
pub struct CursorComponent;

impl CursorComponent {
    pub const IDENTIFIER: &'static str = "minecraft:cursor";
}

impl Component for CursorComponent {
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

impl EntityComponent for CursorComponent {
    fn on_tick(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let Some(player) = entity.player.as_mut() else {
            return Ok(());
        };
        let session = player.session();
        for slot in player.cursor.take_dirty() {
            let stack = player.cursor.get_item(slot)?.cloned();
            ctx.outbound.send(
                session,
                SyncMessage::ContainerSlot {
                    window: WINDOW_UI,
                    slot: UI_CURSOR_SLOT + slot as u32,
                    stack,
                },
            );
        }
        Ok(())
    }
}

/// Streams crafting-grid slot changes to the owning client
#[derive(Debug, Default)]
pub struct CraftingInputComponent;

impl CraftingInputComponent {
    pub const IDENTIFIER: &'static str = "minecraft:crafting_input";
}

impl Component for CraftingInputComponent {
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

impl EntityComponent for CraftingInputComponent {
    fn on_tick(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let Some(player) = entity.player.as_mut() else {
            return Ok(());
        };
        let session = player.session();
        for slot in player.crafting_input.take_dirty() {
            let stack = player.crafting_input.get_item(slot)?.cloned();
            ctx.outbound.send(
                session,
                SyncMessage::ContainerSlot {
                    window: WINDOW_UI,
                    slot: UI_CRAFTING_INPUT_FIRST_SLOT + slot as u32,
                    stack,
                },
            );
        }
        Ok(())
    }
}

/// Streams armor slot changes to the owning client
#[derive(Debug, Default)]
pub struct EquipmentComponent;

impl EquipmentComponent {
    pub const IDENTIFIER: &'static str = "minecraft:equipment";
}

impl Component for EquipmentComponent {
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

impl EntityComponent for EquipmentComponent {
    fn on_tick(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let Some(player) = entity.player.as_mut() else {
            return Ok(());
        };
        let session = player.session();
        for slot in player.armor.take_dirty() {
            let stack = player.armor.get_item(slot)?.cloned();
            ctx.outbound.send(
                session,
                SyncMessage::ContainerSlot {
                    window: WINDOW_ARMOR,
                    slot: slot as u32,
                    stack,
                },
            );
        }
        Ok(())
    }
}
