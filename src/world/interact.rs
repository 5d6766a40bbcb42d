//! Inbound intent handling
//!
//! Every client message drains here from the tick loop. Handlers
//! resolve the acting player, route the intent through component
//! dispatch or the transaction engine, and queue whatever state the
//! mutation made visible. Recoverable mismatches answer the client;
//! protocol violations propagate so the drain can drop the session.

use std::collections::BTreeSet;

use glam::Vec3;
use rand::Rng;

use super::{dispatch, TickContext, World};
use crate::component::block::{BreakableComponent, ChestComponent};
use crate::component::{InteractKind, UseCause, UseMethod};
use crate::container::transaction::{process_requests, StackRequest};
use crate::error::{SimError, SimResult};
use crate::item::{BlockPlacerDefinition, ItemStack};
use crate::network::{
    ClientMessage, DisconnectReason, InboundMessage, SessionId, SyncMessage,
};
use crate::position::{BlockFace, BlockPosition};
use crate::registry::RegistryEntry;

/// Items leave the hand at roughly eye height
const DROP_HEIGHT: f32 = 1.62;

pub(super) fn handle_message(world: &mut World, inbound: InboundMessage) -> SimResult<()> {
    let session = inbound.session;
    match inbound.message {
        ClientMessage::StackRequests(requests) => handle_stack_requests(world, session, requests),
        ClientMessage::UseItem { cause } => {
            let (dimension_id, runtime_id) = locate_player(world, session)?;
            use_held_item(world, &dimension_id, runtime_id, session, cause, None).map(|_| ())
        }
        ClientMessage::UseItemOn { position, face } => {
            handle_use_item_on(world, session, position, face)
        }
        ClientMessage::UseItemOnEntity {
            target_runtime_id,
            kind,
        } => handle_use_item_on_entity(world, session, target_runtime_id, kind),
        ClientMessage::ReleaseItem => handle_release_item(world, session),
        ClientMessage::StartBreak { position } => handle_start_break(world, session, position),
        ClientMessage::AbortBreak { position } => handle_abort_break(world, session, position),
        ClientMessage::StopBreak { position } => handle_stop_break(world, session, position),
        ClientMessage::SelectSlot { slot } => handle_select_slot(world, session, slot),
        ClientMessage::CloseContainer { window } => {
            handle_close_container(world, session, window)
        }
        ClientMessage::Disconnect => {
            world.drop_player_session(session);
            world
                .outbound
                .disconnect(session, DisconnectReason::ClientQuit);
            Ok(())
        }
    }
}

/// The dimension and runtime id of the player bound to a session
fn locate_player(world: &World, session: SessionId) -> SimResult<(String, u64)> {
    for (identifier, dimension) in &world.dimensions {
        if let Some(runtime_id) = dimension.player_by_session(session) {
            return Ok((identifier.clone(), runtime_id));
        }
    }
    Err(SimError::PlayerNotFound {
        session: session.raw(),
    })
}

fn handle_stack_requests(
    world: &mut World,
    session: SessionId,
    requests: Vec<StackRequest>,
) -> SimResult<()> {
    let (dimension_id, runtime_id) = locate_player(world, session)?;
    let dimension = world
        .dimensions
        .get_mut(&dimension_id)
        .ok_or_else(|| SimError::Internal {
            message: format!("unknown dimension '{}'", dimension_id),
        })?;
    let mut entity = dimension
        .take_entity(runtime_id)
        .ok_or(SimError::EntityNotFound { runtime_id })?;

    let opened_position = entity
        .player
        .as_ref()
        .and_then(|data| data.opened)
        .map(|opened| opened.position);
    let opened = opened_position
        .and_then(|position| dimension.block_at_mut(position))
        .and_then(|entry| entry.container.as_mut());

    let result = match entity.player.as_mut() {
        Some(data) => {
            let creative = data.gamemode.is_creative();
            let mut views = data.container_views(opened);
            process_requests(&mut views, &requests, &world.registries.items, creative)
        }
        None => Err(SimError::EntityNotPlayer { runtime_id }),
    };

    // The response snapshots are authoritative for the requester, so
    // the player-owned dirty bits are consumed here. The opened block
    // container keeps its bits for the viewer sync on the next tick.
    if let Some(data) = entity.player.as_mut() {
        data.inventory.take_dirty();
        data.cursor.take_dirty();
        data.armor.take_dirty();
        data.crafting_input.take_dirty();
    }
    dimension.put_entity(entity);
    let outcome = result?;

    world.outbound.send(
        session,
        SyncMessage::StackResponses {
            responses: outcome.responses,
        },
    );

    if outcome.dropped.is_empty() {
        return Ok(());
    }
    let (origin, look) = {
        let entity = world
            .dimensions
            .get(&dimension_id)
            .and_then(|dimension| dimension.entity(runtime_id))
            .ok_or(SimError::EntityNotFound { runtime_id })?;
        (
            entity.position + Vec3::new(0.0, DROP_HEIGHT, 0.0),
            entity.look_direction(),
        )
    };
    let mut rng = rand::thread_rng();
    for dropped in outcome.dropped {
        let velocity = if dropped.randomly {
            Vec3::new(rng.gen_range(-0.2..0.2), 0.2, rng.gen_range(-0.2..0.2))
        } else {
            look * 0.3
        };
        world.spawn_item(&dimension_id, dropped.stack, origin, velocity)?;
    }
    Ok(())
}

/// Run the held stack through its item components and announce a
/// completed use to the owner and its observers.
fn use_held_item(
    world: &mut World,
    dimension_id: &str,
    runtime_id: u64,
    session: SessionId,
    cause: UseCause,
    clicked: Option<BlockPosition>,
) -> SimResult<Option<UseMethod>> {
    let dimension = world
        .dimensions
        .get_mut(dimension_id)
        .ok_or_else(|| SimError::Internal {
            message: format!("unknown dimension '{}'", dimension_id),
        })?;
    let mut entity = dimension
        .take_entity(runtime_id)
        .ok_or(SimError::EntityNotFound { runtime_id })?;
    let mut ctx = TickContext {
        current_tick: world.current_tick,
        config: &world.config,
        registries: &world.registries,
        components: &world.component_registry,
        outbound: &mut world.outbound,
    };
    let result = dispatch::use_item(&mut entity, cause, clicked, &mut ctx);

    if let Ok(Some(method)) = &result {
        let mut recipients: BTreeSet<SessionId> = entity.observers.iter().copied().collect();
        recipients.insert(session);
        world.outbound.send_many(
            recipients,
            SyncMessage::CompletedUsingItem {
                runtime_id,
                method: *method,
            },
        );
    }
    dimension.put_entity(entity);
    result
}

fn handle_use_item_on(
    world: &mut World,
    session: SessionId,
    position: BlockPosition,
    face: BlockFace,
) -> SimResult<()> {
    let (dimension_id, runtime_id) = locate_player(world, session)?;

    let (can_interact, can_build, creative) = {
        let entity = world
            .dimensions
            .get(&dimension_id)
            .and_then(|dimension| dimension.entity(runtime_id))
            .ok_or(SimError::EntityNotFound { runtime_id })?;
        let data = entity
            .player
            .as_ref()
            .ok_or(SimError::EntityNotPlayer { runtime_id })?;
        (
            data.gamemode.can_interact(),
            data.gamemode.can_build(),
            data.gamemode.is_creative(),
        )
    };

    // Container blocks capture the click; everything else falls through
    // to the held item
    let interactable = world
        .dimensions
        .get(&dimension_id)
        .and_then(|dimension| dimension.block_at(position))
        .map(|entry| entry.block_type().has_tag("container"))
        .unwrap_or(false);
    if interactable {
        if !can_interact {
            return Ok(());
        }
        return interact_with_block(world, &dimension_id, runtime_id, position);
    }

    if !can_build {
        return Ok(());
    }
    let placer = {
        let entity = world
            .dimensions
            .get(&dimension_id)
            .and_then(|dimension| dimension.entity(runtime_id))
            .ok_or(SimError::EntityNotFound { runtime_id })?;
        let data = entity
            .player
            .as_ref()
            .ok_or(SimError::EntityNotPlayer { runtime_id })?;
        match data.held_item() {
            Some(stack) => BlockPlacerDefinition::from_components(stack.item_type().components())?,
            None => None,
        }
    };

    let target = position.offset(face);
    let method = use_held_item(
        world,
        &dimension_id,
        runtime_id,
        session,
        UseCause::Click,
        Some(target),
    )?;
    if method != Some(UseMethod::Place) {
        return Ok(());
    }
    let Some(placer) = placer else {
        return Ok(());
    };

    let clicked_allowed = match world
        .dimensions
        .get(&dimension_id)
        .and_then(|dimension| dimension.block_at(position))
    {
        Some(entry) => placer.can_use_on(entry.block_type()),
        None => placer.use_on.is_empty(),
    };
    if !clicked_allowed {
        log::debug!(
            "'{}' cannot be used on the block at {}",
            placer.block_identifier,
            position
        );
        return Ok(());
    }
    let occupied = world
        .dimensions
        .get(&dimension_id)
        .and_then(|dimension| dimension.block_at(target))
        .is_some();
    if occupied {
        log::debug!("Placement target {} is occupied", target);
        return Ok(());
    }

    if !creative {
        let entity = world
            .dimensions
            .get_mut(&dimension_id)
            .and_then(|dimension| dimension.entity_mut(runtime_id))
            .ok_or(SimError::EntityNotFound { runtime_id })?;
        let data = entity
            .player
            .as_mut()
            .ok_or(SimError::EntityNotPlayer { runtime_id })?;
        data.shrink_held(1)?;
    }
    world.set_block(&dimension_id, target, &placer.block_identifier)
}

fn interact_with_block(
    world: &mut World,
    dimension_id: &str,
    runtime_id: u64,
    position: BlockPosition,
) -> SimResult<()> {
    let dimension = world
        .dimensions
        .get_mut(dimension_id)
        .ok_or_else(|| SimError::Internal {
            message: format!("unknown dimension '{}'", dimension_id),
        })?;
    let Some(mut entry) = dimension.take_block(position) else {
        return Ok(());
    };
    let Some(mut entity) = dimension.take_entity(runtime_id) else {
        dimension.put_block(entry);
        return Err(SimError::EntityNotFound { runtime_id });
    };
    let mut ctx = TickContext {
        current_tick: world.current_tick,
        config: &world.config,
        registries: &world.registries,
        components: &world.component_registry,
        outbound: &mut world.outbound,
    };
    let result = dispatch::interact_block_components(&mut entry, &mut entity, &mut ctx);
    dimension.put_entity(entity);
    dimension.put_block(entry);
    result
}

fn handle_use_item_on_entity(
    world: &mut World,
    session: SessionId,
    target_runtime_id: u64,
    kind: InteractKind,
) -> SimResult<()> {
    let (dimension_id, runtime_id) = locate_player(world, session)?;
    if target_runtime_id == runtime_id {
        return Err(SimError::ProtocolViolation {
            message: "player interacted with its own entity".to_string(),
        });
    }
    let dimension = world
        .dimensions
        .get_mut(&dimension_id)
        .ok_or_else(|| SimError::Internal {
            message: format!("unknown dimension '{}'", dimension_id),
        })?;
    let mut player = dimension
        .take_entity(runtime_id)
        .ok_or(SimError::EntityNotFound { runtime_id })?;
    let Some(mut target) = dimension.take_entity(target_runtime_id) else {
        dimension.put_entity(player);
        return Err(SimError::EntityNotFound {
            runtime_id: target_runtime_id,
        });
    };
    let mut ctx = TickContext {
        current_tick: world.current_tick,
        config: &world.config,
        registries: &world.registries,
        components: &world.component_registry,
        outbound: &mut world.outbound,
    };
    let result = dispatch::interact_entity_components(&mut target, &mut player, kind, &mut ctx);
    dimension.put_entity(target);
    dimension.put_entity(player);
    result
}

fn handle_release_item(world: &mut World, session: SessionId) -> SimResult<()> {
    let (dimension_id, runtime_id) = locate_player(world, session)?;
    let dimension = world
        .dimensions
        .get_mut(&dimension_id)
        .ok_or_else(|| SimError::Internal {
            message: format!("unknown dimension '{}'", dimension_id),
        })?;
    let mut entity = dimension
        .take_entity(runtime_id)
        .ok_or(SimError::EntityNotFound { runtime_id })?;
    let mut ctx = TickContext {
        current_tick: world.current_tick,
        config: &world.config,
        registries: &world.registries,
        components: &world.component_registry,
        outbound: &mut world.outbound,
    };
    let result = dispatch::release_item(&mut entity, &mut ctx);
    dimension.put_entity(entity);
    result
}

fn handle_start_break(
    world: &mut World,
    session: SessionId,
    position: BlockPosition,
) -> SimResult<()> {
    let (dimension_id, runtime_id) = locate_player(world, session)?;
    let (can_break, creative) = breaker_abilities(world, &dimension_id, runtime_id)?;
    if !can_break {
        return Ok(());
    }
    if creative {
        // Creative mining completes on the first swing and drops nothing
        return break_block(world, &dimension_id, Some(runtime_id), position, false);
    }
    let dimension = world
        .dimensions
        .get_mut(&dimension_id)
        .ok_or_else(|| SimError::Internal {
            message: format!("unknown dimension '{}'", dimension_id),
        })?;
    let Some(mut entry) = dimension.take_block(position) else {
        log::debug!("Runtime id {} started mining empty {}", runtime_id, position);
        return Ok(());
    };
    let Some(mut entity) = dimension.take_entity(runtime_id) else {
        dimension.put_block(entry);
        return Err(SimError::EntityNotFound { runtime_id });
    };
    let mut ctx = TickContext {
        current_tick: world.current_tick,
        config: &world.config,
        registries: &world.registries,
        components: &world.component_registry,
        outbound: &mut world.outbound,
    };
    let result = dispatch::start_break_components(&mut entry, &mut entity, &mut ctx);
    dimension.put_entity(entity);
    dimension.put_block(entry);
    result
}

fn handle_abort_break(
    world: &mut World,
    session: SessionId,
    position: BlockPosition,
) -> SimResult<()> {
    let (dimension_id, runtime_id) = locate_player(world, session)?;
    let dimension = world
        .dimensions
        .get_mut(&dimension_id)
        .ok_or_else(|| SimError::Internal {
            message: format!("unknown dimension '{}'", dimension_id),
        })?;
    let Some(mut entry) = dimension.take_block(position) else {
        return Ok(());
    };
    let Some(mut entity) = dimension.take_entity(runtime_id) else {
        dimension.put_block(entry);
        return Err(SimError::EntityNotFound { runtime_id });
    };
    let mut ctx = TickContext {
        current_tick: world.current_tick,
        config: &world.config,
        registries: &world.registries,
        components: &world.component_registry,
        outbound: &mut world.outbound,
    };
    let result = dispatch::stop_break_components(&mut entry, &mut entity, &mut ctx);
    dimension.put_entity(entity);
    dimension.put_block(entry);
    result
}

fn handle_stop_break(
    world: &mut World,
    session: SessionId,
    position: BlockPosition,
) -> SimResult<()> {
    let (dimension_id, runtime_id) = locate_player(world, session)?;
    let (can_break, creative) = breaker_abilities(world, &dimension_id, runtime_id)?;
    if !can_break {
        return Ok(());
    }
    let satisfied = world
        .dimensions
        .get(&dimension_id)
        .and_then(|dimension| dimension.block_at(position))
        .and_then(|entry| {
            entry
                .components
                .get_as::<BreakableComponent>(BreakableComponent::IDENTIFIER)
        })
        .map(|breakable| breakable.mining_satisfied(runtime_id, world.current_tick))
        .unwrap_or(false);

    if satisfied || creative {
        break_block(world, &dimension_id, Some(runtime_id), position, !creative)
    } else {
        // The claim does not match the recorded progress; restate the
        // authoritative block so the client repairs itself
        let network_id = world
            .block_type_at(&dimension_id, position)
            .map(|block_type| block_type.network_id())
            .unwrap_or_else(|| air_network_id(world));
        log::debug!(
            "Rejected break claim from runtime id {} at {}",
            runtime_id,
            position
        );
        world
            .outbound
            .send(session, SyncMessage::BlockUpdate { position, network_id });
        Ok(())
    }
}

fn breaker_abilities(
    world: &World,
    dimension_id: &str,
    runtime_id: u64,
) -> SimResult<(bool, bool)> {
    let entity = world
        .dimensions
        .get(dimension_id)
        .and_then(|dimension| dimension.entity(runtime_id))
        .ok_or(SimError::EntityNotFound { runtime_id })?;
    let data = entity
        .player
        .as_ref()
        .ok_or(SimError::EntityNotPlayer { runtime_id })?;
    Ok((data.gamemode.can_break(), data.gamemode.is_creative()))
}

fn air_network_id(world: &World) -> i32 {
    world
        .registries
        .blocks
        .get("minecraft:air")
        .map(|block| block.network_id())
        .unwrap_or(0)
}

/// Remove a block, run its break hooks and scatter its drops
fn break_block(
    world: &mut World,
    dimension_id: &str,
    breaker: Option<u64>,
    position: BlockPosition,
    with_drops: bool,
) -> SimResult<()> {
    let air_id = air_network_id(world);
    let dimension = world
        .dimensions
        .get_mut(dimension_id)
        .ok_or_else(|| SimError::Internal {
            message: format!("unknown dimension '{}'", dimension_id),
        })?;
    let Some(mut entry) = dimension.take_block(position) else {
        return Ok(());
    };
    let mut breaker_entity = breaker.and_then(|runtime_id| dimension.take_entity(runtime_id));
    let mut ctx = TickContext {
        current_tick: world.current_tick,
        config: &world.config,
        registries: &world.registries,
        components: &world.component_registry,
        outbound: &mut world.outbound,
    };
    if let Err(error) = dispatch::break_block_components(&mut entry, breaker_entity.as_mut(), &mut ctx)
    {
        // The block is already gone; a failing hook cannot bring it back
        log::error!("Break hook failed at {}: {}", position, error);
    }
    if let Some(entity) = breaker_entity {
        dimension.put_entity(entity);
    }

    let sessions = dimension.player_sessions();
    world.outbound.send_many(
        sessions,
        SyncMessage::BlockUpdate {
            position,
            network_id: air_id,
        },
    );
    log::debug!("Broke '{}' at {}", entry.identifier(), position);

    if !with_drops {
        return Ok(());
    }
    let mut drops: Vec<ItemStack> = Vec::new();
    if let Some(container) = entry.container.as_mut() {
        for slot in 0..container.size() {
            if let Some(stack) = container.clear_slot(slot)? {
                drops.push(stack);
            }
        }
    }
    match world.registries.items.get(entry.block_type().drops()) {
        Some(item_type) => drops.push(ItemStack::new(item_type, 1)),
        None => log::debug!(
            "'{}' has no item form to drop",
            entry.block_type().drops()
        ),
    }
    for stack in drops {
        world.spawn_item(dimension_id, stack, position.center(), Vec3::ZERO)?;
    }
    Ok(())
}

fn handle_select_slot(world: &mut World, session: SessionId, slot: u8) -> SimResult<()> {
    let (dimension_id, runtime_id) = locate_player(world, session)?;
    let entity = world
        .dimensions
        .get_mut(&dimension_id)
        .and_then(|dimension| dimension.entity_mut(runtime_id))
        .ok_or(SimError::EntityNotFound { runtime_id })?;
    let data = entity
        .player
        .as_mut()
        .ok_or(SimError::EntityNotPlayer { runtime_id })?;
    data.select_slot(slot)
}

fn handle_close_container(world: &mut World, session: SessionId, window: u8) -> SimResult<()> {
    let (dimension_id, runtime_id) = locate_player(world, session)?;
    let dimension = world
        .dimensions
        .get_mut(&dimension_id)
        .ok_or_else(|| SimError::Internal {
            message: format!("unknown dimension '{}'", dimension_id),
        })?;
    let entity = dimension
        .entity_mut(runtime_id)
        .ok_or(SimError::EntityNotFound { runtime_id })?;
    let data = entity
        .player
        .as_mut()
        .ok_or(SimError::EntityNotPlayer { runtime_id })?;

    // Whatever is left on the cursor or crafting grid goes back into
    // the inventory; what does not fit falls to the ground
    let mut leftovers: Vec<ItemStack> = Vec::new();
    for slot in 0..data.cursor.size() {
        if let Some(stack) = data.cursor.clear_slot(slot)? {
            if let Some(rest) = data.inventory.add_item(stack) {
                leftovers.push(rest);
            }
        }
    }
    for slot in 0..data.crafting_input.size() {
        if let Some(stack) = data.crafting_input.clear_slot(slot)? {
            if let Some(rest) = data.inventory.add_item(stack) {
                leftovers.push(rest);
            }
        }
    }

    let opened = data.close_window();
    let drop_origin = entity.position + Vec3::new(0.0, DROP_HEIGHT, 0.0);

    if let Some(opened) = opened {
        if opened.window != window {
            log::debug!(
                "{} closed window {} while {} was open",
                session,
                window,
                opened.window
            );
        }
        if let Some(chest) = dimension
            .block_at_mut(opened.position)
            .and_then(|entry| {
                entry
                    .components
                    .get_as_mut::<ChestComponent>(ChestComponent::IDENTIFIER)
            })
        {
            chest.remove_viewer(session);
        }
    }
    world
        .outbound
        .send(session, SyncMessage::CloseContainer { window });

    for stack in leftovers {
        world.spawn_item(&dimension_id, stack, drop_origin, Vec3::ZERO)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::AttributeKind;
    use crate::config::SimulationConfig;
    use crate::container::transaction::{
        ContainerName, RequestAction, ResponseStatus, SlotRef, TransactionError,
    };
    use crate::entity::Gamemode;
    use crate::network::{RecordingSink, UI_CURSOR_SLOT, WINDOW_UI};
    use crate::world::{World, OVERWORLD};

    fn world_with_player() -> (World, SessionId, u64) {
        let mut world = World::vanilla(SimulationConfig::default()).expect("vanilla world");
        let session = world.sessions().open("steve");
        let runtime_id = world
            .spawn_player(OVERWORLD, session, Vec3::new(0.5, 64.0, 0.5))
            .expect("player");
        (world, session, runtime_id)
    }

    fn give(world: &mut World, runtime_id: u64, slot: usize, identifier: &str, amount: i32) {
        let item_type = world.registries().items.get(identifier).expect("item type");
        let stack = ItemStack::new(item_type, amount);
        let entity = world
            .overworld_mut()
            .entity_mut(runtime_id)
            .expect("player entity");
        let data = entity.player.as_mut().expect("player data");
        data.inventory.set_item(slot, stack).expect("give");
        data.inventory.take_dirty();
    }

    fn submit_and_tick(world: &mut World, session: SessionId, message: ClientMessage) -> RecordingSink {
        world.handle().submit(session, message).expect("submit");
        let mut sink = RecordingSink::new();
        world.tick(&mut sink).expect("tick");
        sink
    }

    #[test]
    fn test_place_action_moves_cursor_stack_into_inventory() {
        let (mut world, session, runtime_id) = world_with_player();
        let dirt = world
            .registries()
            .items
            .get("minecraft:dirt")
            .expect("dirt item");
        {
            let entity = world
                .overworld_mut()
                .entity_mut(runtime_id)
                .expect("player");
            let data = entity.player.as_mut().expect("player data");
            data.cursor
                .set_item(0, ItemStack::new(dirt, 5))
                .expect("cursor stack");
        }

        let request = StackRequest {
            request_id: 1,
            actions: vec![RequestAction::Place {
                count: 5,
                source: SlotRef::new(ContainerName::Cursor, UI_CURSOR_SLOT as u8),
                destination: SlotRef::new(ContainerName::HotbarAndInventory, 9),
            }],
        };
        let sink = submit_and_tick(&mut world, session, ClientMessage::StackRequests(vec![request]));

        let entity = world.overworld().entity(runtime_id).expect("player");
        let data = entity.player.as_ref().expect("player data");
        let placed = data.inventory.get_item(9).expect("slot").expect("stack");
        assert_eq!(placed.identifier(), "minecraft:dirt");
        assert_eq!(placed.amount(), 5);
        assert!(data.cursor.get_item(0).expect("slot").is_none());

        let ok = sink.messages_for(session).iter().any(|message| {
            matches!(
                message,
                SyncMessage::StackResponses { responses }
                    if responses.len() == 1
                        && responses[0].request_id == 1
                        && responses[0].status == ResponseStatus::Ok
            )
        });
        assert!(ok);
    }

    #[test]
    fn test_unknown_creative_id_answers_error_without_mutation() {
        let (mut world, session, runtime_id) = world_with_player();
        {
            let entity = world
                .overworld_mut()
                .entity_mut(runtime_id)
                .expect("player");
            entity.player.as_mut().expect("player data").gamemode = Gamemode::Creative;
        }
        let request = StackRequest {
            request_id: 7,
            actions: vec![
                RequestAction::CraftCreative {
                    network_id: 99_999,
                    count: 1,
                },
                RequestAction::Take {
                    count: 1,
                    source: SlotRef::new(ContainerName::CreativeOutput, 50),
                    destination: SlotRef::new(ContainerName::Cursor, 0),
                },
            ],
        };
        let sink = submit_and_tick(&mut world, session, ClientMessage::StackRequests(vec![request]));

        let entity = world.overworld().entity(runtime_id).expect("player");
        let data = entity.player.as_ref().expect("player data");
        assert!(data.cursor.is_empty());
        assert!(data.inventory.is_empty());

        let rejected = sink.messages_for(session).iter().any(|message| {
            matches!(
                message,
                SyncMessage::StackResponses { responses }
                    if responses[0].request_id == 7
                        && matches!(
                            &responses[0].status,
                            ResponseStatus::Error {
                                cause: TransactionError::UnknownCreativeItem(99_999)
                            }
                        )
            )
        });
        assert!(rejected);
    }

    #[test]
    fn test_use_item_on_places_held_block() {
        let (mut world, session, runtime_id) = world_with_player();
        let base = BlockPosition::new(0, 63, 0);
        world
            .set_block(OVERWORLD, base, "minecraft:stone")
            .expect("base block");
        give(&mut world, runtime_id, 0, "minecraft:dirt", 3);

        submit_and_tick(
            &mut world,
            session,
            ClientMessage::UseItemOn {
                position: base,
                face: BlockFace::Top,
            },
        );

        let placed = world
            .block_type_at(OVERWORLD, BlockPosition::new(0, 64, 0))
            .expect("placed block");
        assert_eq!(placed.identifier(), "minecraft:dirt");

        let entity = world.overworld().entity(runtime_id).expect("player");
        let data = entity.player.as_ref().expect("player data");
        let held = data.held_item().expect("held stack");
        assert_eq!(held.amount(), 2);
    }

    #[test]
    fn test_chest_click_opens_container_and_close_releases_it() {
        let (mut world, session, _) = world_with_player();
        let position = BlockPosition::new(2, 64, 0);
        world
            .set_block(OVERWORLD, position, "minecraft:chest")
            .expect("chest");

        let sink = submit_and_tick(
            &mut world,
            session,
            ClientMessage::UseItemOn {
                position,
                face: BlockFace::Top,
            },
        );
        let window = sink
            .messages_for(session)
            .iter()
            .find_map(|message| match message {
                SyncMessage::OpenContainer { window, position: at, .. } if *at == position => {
                    Some(*window)
                }
                _ => None,
            })
            .expect("open message");
        assert!(sink.messages_for(session).iter().any(|message| matches!(
            message,
            SyncMessage::ContainerContent { window: w, stacks } if *w == window && stacks.len() == 27
        )));

        let sink = submit_and_tick(&mut world, session, ClientMessage::CloseContainer { window });
        assert!(sink.messages_for(session).iter().any(|message| matches!(
            message,
            SyncMessage::CloseContainer { window: w } if *w == window
        )));
        let chest = world
            .overworld()
            .block_at(position)
            .and_then(|entry| {
                entry
                    .components
                    .get_as::<ChestComponent>(ChestComponent::IDENTIFIER)
            })
            .expect("chest component");
        assert_eq!(chest.viewer_count(), 0);
    }

    #[test]
    fn test_survival_mining_breaks_after_required_ticks() {
        let (mut world, session, _) = world_with_player();
        let position = BlockPosition::new(1, 63, 0);
        world
            .set_block(OVERWORLD, position, "minecraft:dirt")
            .expect("dirt block");

        submit_and_tick(&mut world, session, ClientMessage::StartBreak { position });
        // Dirt at 0.5 hardness bare-handed takes 50 ticks
        let mut sink = RecordingSink::new();
        for _ in 0..50 {
            world.tick(&mut sink).expect("tick");
        }
        let sink = submit_and_tick(&mut world, session, ClientMessage::StopBreak { position });

        assert!(world.block_type_at(OVERWORLD, position).is_none());
        let air_id = world
            .registries()
            .blocks
            .get("minecraft:air")
            .expect("air")
            .network_id();
        assert!(sink.messages_for(session).iter().any(|message| matches!(
            message,
            SyncMessage::BlockUpdate { position: at, network_id }
                if *at == position && *network_id == air_id
        )));
        // The drop entered the world as an item entity
        assert!(world
            .overworld()
            .entities()
            .any(|entity| entity.identifier() == "minecraft:item"));
    }

    #[test]
    fn test_premature_break_claim_restates_the_block() {
        let (mut world, session, _) = world_with_player();
        let position = BlockPosition::new(1, 63, 0);
        world
            .set_block(OVERWORLD, position, "minecraft:stone")
            .expect("stone block");

        submit_and_tick(&mut world, session, ClientMessage::StartBreak { position });
        let sink = submit_and_tick(&mut world, session, ClientMessage::StopBreak { position });

        let stone = world
            .block_type_at(OVERWORLD, position)
            .expect("block still present");
        assert_eq!(stone.identifier(), "minecraft:stone");
        assert!(sink.messages_for(session).iter().any(|message| matches!(
            message,
            SyncMessage::BlockUpdate { position: at, network_id }
                if *at == position && *network_id == stone.network_id()
        )));
    }

    #[test]
    fn test_creative_break_skips_mining_and_drops() {
        let (mut world, session, runtime_id) = world_with_player();
        {
            let entity = world
                .overworld_mut()
                .entity_mut(runtime_id)
                .expect("player");
            entity.player.as_mut().expect("player data").gamemode = Gamemode::Creative;
        }
        let position = BlockPosition::new(3, 63, 0);
        world
            .set_block(OVERWORLD, position, "minecraft:stone")
            .expect("stone block");

        submit_and_tick(&mut world, session, ClientMessage::StartBreak { position });
        assert!(world.block_type_at(OVERWORLD, position).is_none());
        assert!(!world
            .overworld()
            .entities()
            .any(|entity| entity.identifier() == "minecraft:item"));
    }

    #[test]
    fn test_out_of_range_slot_selection_disconnects() {
        let (mut world, session, _) = world_with_player();
        let sink = submit_and_tick(&mut world, session, ClientMessage::SelectSlot { slot: 12 });
        assert!(sink
            .disconnected
            .iter()
            .any(|(dropped, reason)| *dropped == session
                && matches!(reason, DisconnectReason::ProtocolViolation(_))));
    }

    #[test]
    fn test_eating_completes_after_hold_duration() {
        let (mut world, session, runtime_id) = world_with_player();
        give(&mut world, runtime_id, 0, "minecraft:apple", 2);
        {
            let entity = world
                .overworld_mut()
                .entity_mut(runtime_id)
                .expect("player");
            entity
                .attributes
                .set_current_value(AttributeKind::Hunger, 10.0)
                .expect("hunger");
            entity.attributes.clear_dirty();
        }

        submit_and_tick(&mut world, session, ClientMessage::UseItem { cause: UseCause::Click });
        let mut sink = RecordingSink::new();
        for _ in 0..32 {
            world.tick(&mut sink).expect("tick");
        }
        let sink = submit_and_tick(&mut world, session, ClientMessage::UseItem { cause: UseCause::Click });

        assert!(sink.messages_for(session).iter().any(|message| matches!(
            message,
            SyncMessage::CompletedUsingItem { method: UseMethod::Eat, .. }
        )));
        let entity = world.overworld().entity(runtime_id).expect("player");
        let data = entity.player.as_ref().expect("player data");
        assert_eq!(data.held_item().expect("held").amount(), 1);
        let hunger = entity
            .attributes
            .get(AttributeKind::Hunger)
            .expect("hunger entry");
        assert!(hunger.current_value() > 10.0);
    }

    #[test]
    fn test_release_interrupts_eating_without_consuming() {
        let (mut world, session, runtime_id) = world_with_player();
        give(&mut world, runtime_id, 0, "minecraft:apple", 2);
        {
            let entity = world
                .overworld_mut()
                .entity_mut(runtime_id)
                .expect("player");
            entity
                .attributes
                .set_current_value(AttributeKind::Hunger, 10.0)
                .expect("hunger");
            entity.attributes.clear_dirty();
        }

        submit_and_tick(&mut world, session, ClientMessage::UseItem { cause: UseCause::Click });
        let mut sink = RecordingSink::new();
        for _ in 0..5 {
            world.tick(&mut sink).expect("tick");
        }
        let sink = submit_and_tick(&mut world, session, ClientMessage::ReleaseItem);

        assert!(!sink.messages_for(session).iter().any(|message| matches!(
            message,
            SyncMessage::CompletedUsingItem { .. }
        )));
        let entity = world.overworld().entity(runtime_id).expect("player");
        let data = entity.player.as_ref().expect("player data");
        assert_eq!(data.held_item().expect("held").amount(), 2);
        let hunger = entity
            .attributes
            .get(AttributeKind::Hunger)
            .expect("hunger entry");
        assert_eq!(hunger.current_value(), 10.0);
    }

    #[test]
    fn test_close_container_returns_cursor_stack_to_inventory() {
        let (mut world, session, runtime_id) = world_with_player();
        let dirt = world
            .registries()
            .items
            .get("minecraft:dirt")
            .expect("dirt item");
        {
            let entity = world
                .overworld_mut()
                .entity_mut(runtime_id)
                .expect("player");
            let data = entity.player.as_mut().expect("player data");
            data.cursor
                .set_item(0, ItemStack::new(dirt, 4))
                .expect("cursor stack");
        }

        submit_and_tick(
            &mut world,
            session,
            ClientMessage::CloseContainer { window: WINDOW_UI },
        );

        let entity = world.overworld().entity(runtime_id).expect("player");
        let data = entity.player.as_ref().expect("player data");
        assert!(data.cursor.is_empty());
        let returned: i32 = data
            .inventory
            .snapshot()
            .iter()
            .flatten()
            .map(ItemStack::amount)
            .sum();
        assert_eq!(returned, 4);
    }
}
