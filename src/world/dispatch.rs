//! Component hook dispatch
//!
//! Hooks receive the owner itself, so the owner's component set is
//! detached for the duration of a dispatch and merged back afterwards.
//! Components an owner gains during a hook survive the merge; the hook
//! error (if any) surfaces only after the set is restored.

use std::mem;

use crate::component::entity::EffectsComponent;
use crate::component::{
    BlockComponent, ComponentSet, EntityComponent, InteractKind, UseCause, UseMethod,
};
use crate::entity::{Effect, EffectType, Entity};
use crate::error::{SimError, SimResult};
use crate::position::BlockPosition;
use crate::world::{BlockEntry, TickContext};

fn with_entity_components<R>(
    entity: &mut Entity,
    f: impl FnOnce(&mut ComponentSet<dyn EntityComponent>, &mut Entity) -> R,
) -> R {
    let mut set = mem::take(&mut entity.components);
    let result = f(&mut set, entity);
    for added in mem::take(&mut entity.components).into_entries() {
        set.register(added);
    }
    entity.components = set;
    result
}

fn with_block_components<R>(
    entry: &mut BlockEntry,
    f: impl FnOnce(&mut ComponentSet<dyn BlockComponent>, &mut BlockEntry) -> R,
) -> R {
    let mut set = mem::take(&mut entry.components);
    let result = f(&mut set, entry);
    for added in mem::take(&mut entry.components).into_entries() {
        set.register(added);
    }
    entry.components = set;
    result
}

pub fn spawn_entity_components(entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
    with_entity_components(entity, |set, entity| {
        for component in set.iter_mut() {
            component.on_spawn(entity, ctx)?;
        }
        Ok(())
    })
}

pub fn despawn_entity_components(entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
    with_entity_components(entity, |set, entity| {
        for component in set.iter_mut() {
            component.on_despawn(entity, ctx)?;
        }
        Ok(())
    })
}

pub fn tick_entity_components(entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
    with_entity_components(entity, |set, entity| {
        for component in set.iter_mut() {
            component.on_tick(entity, ctx)?;
        }
        Ok(())
    })
}

pub fn interact_entity_components(
    target: &mut Entity,
    player: &mut Entity,
    kind: InteractKind,
    ctx: &mut TickContext<'_>,
) -> SimResult<()> {
    with_entity_components(target, |set, target| {
        for component in set.iter_mut() {
            component.on_interact(target, player, kind, ctx)?;
        }
        Ok(())
    })
}

pub fn place_block_components(
    entry: &mut BlockEntry,
    mut player: Option<&mut Entity>,
    ctx: &mut TickContext<'_>,
) -> SimResult<()> {
    with_block_components(entry, |set, entry| {
        for component in set.iter_mut() {
            component.on_place(entry, player.as_deref_mut(), ctx)?;
        }
        Ok(())
    })
}

pub fn tick_block_components(entry: &mut BlockEntry, ctx: &mut TickContext<'_>) -> SimResult<()> {
    with_block_components(entry, |set, entry| {
        for component in set.iter_mut() {
            component.on_tick(entry, ctx)?;
        }
        Ok(())
    })
}

pub fn interact_block_components(
    entry: &mut BlockEntry,
    player: &mut Entity,
    ctx: &mut TickContext<'_>,
) -> SimResult<()> {
    with_block_components(entry, |set, entry| {
        for component in set.iter_mut() {
            component.on_interact(entry, player, ctx)?;
        }
        Ok(())
    })
}

pub fn start_break_components(
    entry: &mut BlockEntry,
    player: &mut Entity,
    ctx: &mut TickContext<'_>,
) -> SimResult<()> {
    with_block_components(entry, |set, entry| {
        for component in set.iter_mut() {
            component.on_start_break(entry, player, ctx)?;
        }
        Ok(())
    })
}

pub fn stop_break_components(
    entry: &mut BlockEntry,
    player: &mut Entity,
    ctx: &mut TickContext<'_>,
) -> SimResult<()> {
    with_block_components(entry, |set, entry| {
        for component in set.iter_mut() {
            component.on_stop_break(entry, player, ctx)?;
        }
        Ok(())
    })
}

pub fn break_block_components(
    entry: &mut BlockEntry,
    mut player: Option<&mut Entity>,
    ctx: &mut TickContext<'_>,
) -> SimResult<()> {
    with_block_components(entry, |set, entry| {
        for component in set.iter_mut() {
            component.on_break(entry, player.as_deref_mut(), ctx)?;
        }
        Ok(())
    })
}

/// Dispatch an item use through the held stack's components.
///
/// The held stack is detached from the inventory for the duration, so
/// hooks may move or deplete it; whatever survives goes back into the
/// selected slot. The first component reporting a use method wins.
pub fn use_item(
    entity: &mut Entity,
    cause: UseCause,
    clicked: Option<BlockPosition>,
    ctx: &mut TickContext<'_>,
) -> SimResult<Option<UseMethod>> {
    let runtime_id = entity.runtime_id();
    let player = entity
        .player
        .as_mut()
        .ok_or(SimError::EntityNotPlayer { runtime_id })?;
    let slot = player.selected_slot() as usize;
    let mut stack = match player.inventory.clear_slot(slot)? {
        Some(stack) => stack,
        None => return Ok(None),
    };

    let item_type = ctx
        .registries
        .items
        .get(stack.identifier())
        .ok_or_else(|| SimError::UnknownType {
            kind: "item",
            identifier: stack.identifier().to_string(),
        })?;
    let mut components = ctx.components.instantiate_item(&item_type)?;

    let mut method = None;
    let mut failure = None;
    for component in components.iter_mut() {
        match component.on_use(&mut stack, entity, cause, clicked, ctx) {
            Ok(Some(found)) => {
                method = Some(found);
                break;
            }
            Ok(None) => {}
            Err(error) => {
                failure = Some(error);
                break;
            }
        }
    }

    let player = entity
        .player
        .as_mut()
        .ok_or(SimError::EntityNotPlayer { runtime_id })?;
    if !stack.is_depleted() {
        player.inventory.set_item(slot, stack)?;
    }
    match failure {
        Some(error) => Err(error),
        None => Ok(method),
    }
}

/// Dispatch a use release (bow let go, eating interrupted)
pub fn release_item(entity: &mut Entity, ctx: &mut TickContext<'_>) -> SimResult<()> {
    let runtime_id = entity.runtime_id();
    let player = entity
        .player
        .as_mut()
        .ok_or(SimError::EntityNotPlayer { runtime_id })?;
    let slot = player.selected_slot() as usize;
    let mut stack = match player.inventory.clear_slot(slot)? {
        Some(stack) => stack,
        None => return Ok(()),
    };

    let item_type = ctx
        .registries
        .items
        .get(stack.identifier())
        .ok_or_else(|| SimError::UnknownType {
            kind: "item",
            identifier: stack.identifier().to_string(),
        })?;
    let mut components = ctx.components.instantiate_item(&item_type)?;

    let mut failure = None;
    for component in components.iter_mut() {
        if let Err(error) = component.on_release(&mut stack, entity, ctx) {
            failure = Some(error);
            break;
        }
    }

    let player = entity
        .player
        .as_mut()
        .ok_or(SimError::EntityNotPlayer { runtime_id })?;
    if !stack.is_depleted() {
        player.inventory.set_item(slot, stack)?;
    }
    match failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Route an effect application through the entity's effect table
pub fn add_effect(
    entity: &mut Entity,
    effect: Effect,
    ctx: &mut TickContext<'_>,
) -> SimResult<bool> {
    with_entity_components(entity, |set, entity| {
        let effects = set
            .get_as_mut::<EffectsComponent>(EffectsComponent::IDENTIFIER)
            .ok_or_else(|| SimError::ComponentMissing {
                owner: entity.identifier().to_string(),
                identifier: EffectsComponent::IDENTIFIER.to_string(),
            })?;
        effects.add(entity, effect, ctx)
    })
}

/// Remove an effect, firing its removal hook when present
pub fn remove_effect(
    entity: &mut Entity,
    effect_type: EffectType,
    ctx: &mut TickContext<'_>,
) -> SimResult<bool> {
    with_entity_components(entity, |set, entity| {
        let effects = set
            .get_as_mut::<EffectsComponent>(EffectsComponent::IDENTIFIER)
            .ok_or_else(|| SimError::ComponentMissing {
                owner: entity.identifier().to_string(),
                identifier: EffectsComponent::IDENTIFIER.to_string(),
            })?;
        effects.remove(entity, effect_type, ctx)
    })
}
