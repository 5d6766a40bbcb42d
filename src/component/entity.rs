//! Built-in entity components
//!
//! These cover the behavior every living type shares: bounded health and
//! movement attributes, the effect table, visibility and breathing
//! flags, fire damage, nametags, inventory sync and dropped-item
//! lifecycle. Player-only behavior lives in [`crate::component::player`].

use std::any::Any;
use std::collections::BTreeMap;

use glam::Vec3;
use rand::Rng;

use crate::component::{
    ActorFlag, Attribute, AttributeKind, Component, ComponentKind, EntityComponent, MetadataKey,
    MetadataValue,
};
use crate::entity::{Effect, EffectType, Entity};
use crate::error::SimResult;
use crate::item::ItemStack;
use crate::nbt::Tag;
use crate::network::{EffectEventKind, SyncMessage, WINDOW_INVENTORY};
use crate::world::TickContext;

/// Ticks a dropped stack stays on the ground before anyone can collect it
pub const ITEM_PICKUP_DELAY_TICKS: u64 = 10;
/// Ticks a dropped stack survives before despawning
pub const ITEM_LIFESPAN_TICKS: u64 = 6000;
/// Scheduler passes between effect particle color pulses
const EFFECT_PULSE_INTERVAL: u64 = 80;

/// Health attribute plus death-by-zero for non-players
#[derive(Debug, Default)]
pub struct HealthComponent;

impl HealthComponent {
    pub const IDENTIFIER: &'static str = "minecraft:health";
}

impl Component for HealthComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Attribute(AttributeKind::Health)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EntityComponent for HealthComponent {
    fn on_spawn(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        entity
            .attributes
            .apply(Attribute::new(AttributeKind::Health, 0.0, 20.0, 20.0));
        Ok(())
    }

    fn on_tick(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        if let Some(health) = entity.attributes.current_value(AttributeKind::Health) {
            if health <= 0.0 && !entity.is_player() {
                entity.despawn();
            }
        }
        Ok(())
    }
}

/// Movement speed attribute; effects scale it off the default value
#[derive(Debug, Default)]
pub struct MovementComponent;

impl MovementComponent {
    pub const IDENTIFIER: &'static str = "minecraft:movement";
}

impl Component for MovementComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Attribute(AttributeKind::MovementSpeed)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EntityComponent for MovementComponent {
    fn on_spawn(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        entity.attributes.apply(Attribute::new(
            AttributeKind::MovementSpeed,
            0.0,
            f32::MAX,
            0.1,
        ));
        Ok(())
    }
}

/// The per-entity effect table and its scheduler.
///
/// Durations step down once per pass; an effect whose duration runs out
/// fires its removal hook and leaves the table in the same pass. The
/// table persists into the owner's storage on despawn and reloads on
/// spawn, re-applying each effect's modifier.
#[derive(Debug, Default)]
pub struct EffectsComponent {
    effects: BTreeMap<EffectType, Effect>,
}

impl EffectsComponent {
    pub const IDENTIFIER: &'static str = "minecraft:effects";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, effect_type: EffectType) -> bool {
        self.effects.contains_key(&effect_type)
    }

    pub fn get(&self, effect_type: EffectType) -> Option<&Effect> {
        self.effects.get(&effect_type)
    }

    pub fn active(&self) -> impl Iterator<Item = &Effect> {
        self.effects.values()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Apply an effect. Re-adding a type that is still running is a
    /// no-op reporting false; an expired leftover is replaced.
    pub fn add(
        &mut self,
        entity: &mut Entity,
        effect: Effect,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<bool> {
        if let Some(existing) = self.effects.get(&effect.effect_type()) {
            if !existing.is_expired() {
                log::debug!(
                    "Effect {} already active on runtime id {}, ignoring",
                    effect.effect_type(),
                    entity.runtime_id()
                );
                return Ok(false);
            }
        }
        effect.on_add(entity)?;
        self.send_event(entity, &effect, EffectEventKind::Add, ctx);
        self.effects.insert(effect.effect_type(), effect);
        Ok(true)
    }

    /// Remove an effect ahead of expiry, firing its removal hook
    pub fn remove(
        &mut self,
        entity: &mut Entity,
        effect_type: EffectType,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<bool> {
        match self.effects.remove(&effect_type) {
            Some(effect) => {
                effect.on_remove(entity)?;
                self.send_event(entity, &effect, EffectEventKind::Remove, ctx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn send_event(
        &self,
        entity: &Entity,
        effect: &Effect,
        event: EffectEventKind,
        ctx: &mut TickContext<'_>,
    ) {
        if let Some(session) = entity.session() {
            ctx.outbound.send(
                session,
                SyncMessage::EffectEvent {
                    runtime_id: entity.runtime_id(),
                    effect: effect.effect_type(),
                    event,
                    duration: effect.duration(),
                    amplifier: effect.amplifier(),
                    show_particles: effect.shows_particles(),
                },
            );
        }
    }
}

impl Component for EffectsComponent {
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

impl EntityComponent for EffectsComponent {
    fn on_spawn(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        let entries = match entity.storage.get_list("effects") {
            Some(entries) => entries.to_vec(),
            None => return Ok(()),
        };
        for entry in &entries {
            if let Tag::Compound(compound) = entry {
                let effect = Effect::from_nbt(compound)?;
                effect.on_add(entity)?;
                self.effects.insert(effect.effect_type(), effect);
            }
        }
        Ok(())
    }

    fn on_despawn(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        if self.effects.is_empty() {
            entity.storage.remove("effects");
        } else {
            let list = Effect::list_to_nbt(self.effects.values().cloned());
            entity.storage.insert("effects", list);
        }
        Ok(())
    }

    fn on_tick(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let scheduled: Vec<EffectType> = self.effects.keys().copied().collect();
        for effect_type in scheduled {
            let Some(effect) = self.effects.get_mut(&effect_type) else {
                continue;
            };
            effect.on_tick(entity, ctx.current_tick)?;
            effect.decrement();
            if effect.is_expired() {
                if let Some(expired) = self.effects.remove(&effect_type) {
                    expired.on_remove(entity)?;
                    self.send_event(entity, &expired, EffectEventKind::Remove, ctx);
                }
            }
        }

        if ctx.current_tick % EFFECT_PULSE_INTERVAL == 0 {
            let visible: Vec<&Effect> = self
                .effects
                .values()
                .filter(|effect| effect.shows_particles())
                .collect();
            if !visible.is_empty() {
                let pick = rand::thread_rng().gen_range(0..visible.len());
                entity.metadata.set(
                    MetadataKey::EffectColor,
                    MetadataValue::Int(visible[pick].effect_type().color()),
                );
            }
        }
        Ok(())
    }
}

/// Custom-name metadata, reloaded from storage
#[derive(Debug, Default)]
pub struct NametagComponent;

impl NametagComponent {
    pub const IDENTIFIER: &'static str = "minecraft:nametag";
}

impl Component for NametagComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Metadata(MetadataKey::Nametag)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EntityComponent for NametagComponent {
    fn on_spawn(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        if let Some(name) = entity.storage.get_string("CustomName") {
            let name = name.to_string();
            entity
                .metadata
                .set(MetadataKey::Nametag, MetadataValue::String(name));
        }
        Ok(())
    }
}

/// Invisibility flag; the invisibility effect toggles it
#[derive(Debug, Default)]
pub struct VisibilityComponent;

impl VisibilityComponent {
    pub const IDENTIFIER: &'static str = "minecraft:visibility";
}

impl Component for VisibilityComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Flag(ActorFlag::Invisible)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EntityComponent for VisibilityComponent {}

/// Fire flag and the once-a-second burn damage that goes with it
#[derive(Debug, Default)]
pub struct OnFireComponent {
    fire_ticks: u32,
}

impl OnFireComponent {
    pub const IDENTIFIER: &'static str = "minecraft:on_fire";

    pub fn burning(&self) -> bool {
        self.fire_ticks > 0
    }

    pub fn ignite(&mut self, entity: &mut Entity, duration_ticks: u32) {
        self.fire_ticks = self.fire_ticks.max(duration_ticks);
        entity.flags.set(ActorFlag::OnFire, true);
    }

    pub fn extinguish(&mut self, entity: &mut Entity) {
        self.fire_ticks = 0;
        entity.flags.set(ActorFlag::OnFire, false);
    }
}

impl Component for OnFireComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Flag(ActorFlag::OnFire)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EntityComponent for OnFireComponent {
    fn on_tick(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        if self.fire_ticks == 0 {
            return Ok(());
        }
        self.fire_ticks -= 1;
        if self.fire_ticks == 0 {
            entity.flags.set(ActorFlag::OnFire, false);
            return Ok(());
        }
        if self.fire_ticks % 20 == 0 {
            if let Some(health) = entity.attributes.current_value(AttributeKind::Health) {
                entity
                    .attributes
                    .set_current_value(AttributeKind::Health, (health - 1.0).max(0.0))?;
            }
        }
        Ok(())
    }
}

/// Breathing flag plus the air-supply gauge the client renders
#[derive(Debug, Default)]
pub struct BreathingComponent;

impl BreathingComponent {
    pub const IDENTIFIER: &'static str = "minecraft:breathing";
    /// Full air supply in ticks
    pub const FULL_AIR_SUPPLY: i16 = 300;
}

impl Component for BreathingComponent {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Flag(ActorFlag::Breathing)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EntityComponent for BreathingComponent {
    fn on_spawn(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        entity.flags.set(ActorFlag::Breathing, true);
        entity.metadata.set(
            MetadataKey::AirSupply,
            MetadataValue::Short(Self::FULL_AIR_SUPPLY),
        );
        Ok(())
    }
}

/// Streams inventory slot changes to the owning player each tick
#[derive(Debug, Default)]
pub struct InventoryComponent;

impl InventoryComponent {
    pub const IDENTIFIER: &'static str = "minecraft:inventory";
}

impl Component for InventoryComponent {
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

impl EntityComponent for InventoryComponent {
    fn on_tick(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
        if let Some(player) = entity.player.as_mut() {
            let session = player.session();
            for slot in player.inventory.take_dirty() {
                let stack = player.inventory.get_item(slot)?.cloned();
                ctx.outbound.send(
                    session,
                    SyncMessage::ContainerSlot {
                        window: WINDOW_INVENTORY,
                        slot: slot as u32,
                        stack,
                    },
                );
            }
        } else if let Some(container) = entity.container.as_mut() {
            // Entity-held containers have no watching client
            container.take_dirty();
        }
        Ok(())
    }
}

/// Dropped-stack state: pickup delay, lifespan and simple ballistics
#[derive(Debug)]
pub struct ItemEntityComponent {
    stack: Option<ItemStack>,
    pickup_at: u64,
    expire_at: u64,
}

impl Default for ItemEntityComponent {
    fn default() -> Self {
        Self {
            stack: None,
            pickup_at: 0,
            expire_at: u64::MAX,
        }
    }
}

impl ItemEntityComponent {
    pub const IDENTIFIER: &'static str = "minecraft:item";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stack(&mut self, stack: ItemStack, current_tick: u64) {
        self.stack = Some(stack);
        self.pickup_at = current_tick + ITEM_PICKUP_DELAY_TICKS;
        self.expire_at = current_tick + ITEM_LIFESPAN_TICKS;
    }

    pub fn stack(&self) -> Option<&ItemStack> {
        self.stack.as_ref()
    }

    pub fn take_stack(&mut self) -> Option<ItemStack> {
        self.stack.take()
    }

    pub fn pickup_ready(&self, current_tick: u64) -> bool {
        self.stack.is_some() && current_tick >= self.pickup_at
    }
}

impl Component for ItemEntityComponent {
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

impl EntityComponent for ItemEntityComponent {
    fn on_tick(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
        if ctx.current_tick >= self.expire_at {
            entity.despawn();
            return Ok(());
        }
        entity.position += entity.velocity;
        entity.velocity.y -= 0.04;
        entity.velocity *= 0.98;
        let floor = ctx.config.min_build_height as f32;
        if entity.position.y < floor {
            entity.position.y = floor;
            entity.velocity = Vec3::ZERO;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentSet;
    use crate::registry::EntityType;
    use std::sync::Arc;

    fn bare_entity() -> Entity {
        Entity::new(
            Arc::new(EntityType::new("minecraft:zombie", 32)),
            7,
            7,
            Vec3::ZERO,
        )
    }

    #[test]
    fn test_component_kinds_map_to_backing_state() {
        let set: Vec<Box<dyn EntityComponent>> = vec![
            Box::new(HealthComponent),
            Box::new(MovementComponent),
            Box::new(VisibilityComponent),
            Box::new(NametagComponent),
        ];
        assert_eq!(
            set[0].kind(),
            ComponentKind::Attribute(AttributeKind::Health)
        );
        assert_eq!(
            set[1].kind(),
            ComponentKind::Attribute(AttributeKind::MovementSpeed)
        );
        assert_eq!(set[2].kind(), ComponentKind::Flag(ActorFlag::Invisible));
        assert_eq!(set[3].kind(), ComponentKind::Metadata(MetadataKey::Nametag));
    }

    #[test]
    fn test_item_entity_pickup_window() {
        let mut component = ItemEntityComponent::new();
        assert!(!component.pickup_ready(100));

        let items = crate::registry::Registries::vanilla().expect("vanilla registries");
        let stack = ItemStack::new(items.items.get("minecraft:dirt").expect("dirt"), 3);
        component.set_stack(stack, 100);
        assert!(!component.pickup_ready(100 + ITEM_PICKUP_DELAY_TICKS - 1));
        assert!(component.pickup_ready(100 + ITEM_PICKUP_DELAY_TICKS));
    }

    #[test]
    fn test_downcast_through_set() {
        let mut set: ComponentSet<dyn EntityComponent> = ComponentSet::new();
        set.register(Box::new(EffectsComponent::new()));
        let effects = set
            .get_as_mut::<EffectsComponent>(EffectsComponent::IDENTIFIER)
            .expect("registered");
        assert!(effects.is_empty());
    }

    #[test]
    fn test_fire_component_tracks_flag() {
        let mut entity = bare_entity();
        let mut fire = OnFireComponent::default();
        assert!(!fire.burning());

        fire.ignite(&mut entity, 40);
        assert!(fire.burning());
        assert!(entity.flags.get(ActorFlag::OnFire));

        fire.extinguish(&mut entity);
        assert!(!fire.burning());
        assert!(!entity.flags.get(ActorFlag::OnFire));
    }
}
