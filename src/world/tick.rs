//! The tick loop
//!
//! One pass: drain inbound intent, tick entities (players first, then
//! everything within simulation range), tick blocks near players, sweep
//! item pickups and pending despawns, reconcile observers, flush dirty
//! state and hand the queue to the sink. A failing component hook is
//! logged and skipped; a failing inbound message disconnects its sender
//! or is dropped depending on the error.

use std::collections::BTreeSet;

use super::{dispatch, interact, sync, TickContext, World};
use crate::component::entity::ItemEntityComponent;
use crate::entity::Entity;
use crate::error::{SimError, SimResult};
use crate::network::{DisconnectReason, PacketSink, SessionId, SyncMessage};

/// Squared block distance within which a player scoops up item
/// entities
const PICKUP_RANGE_SQ: f32 = 2.25;

impl World {
    /// Run one simulation tick and flush everything queued through the
    /// sink
    pub fn tick(&mut self, sink: &mut dyn PacketSink) -> SimResult<()> {
        self.current_tick += 1;
        self.drain_inbound()?;

        let dimension_ids: Vec<String> = self.dimensions.keys().cloned().collect();
        for dimension_id in &dimension_ids {
            self.tick_entities(dimension_id)?;
            self.tick_blocks(dimension_id)?;
            self.sweep_item_pickups(dimension_id)?;
            self.sweep_despawns(dimension_id)?;

            let view_distance = self.config.view_distance;
            if let Some(dimension) = self.dimensions.get_mut(dimension_id) {
                sync::reconcile_observers(dimension, view_distance, &mut self.outbound);
                sync::flush_dirty_state(dimension, &mut self.outbound);
            }
        }

        self.outbound.flush(sink);
        Ok(())
    }

    /// Mark an entity for removal; its despawn hooks and the observer
    /// notification run in the next sweep.
    pub fn despawn_entity(&mut self, dimension_id: &str, runtime_id: u64) -> SimResult<()> {
        let entity = self
            .dimensions
            .get_mut(dimension_id)
            .and_then(|dimension| dimension.entity_mut(runtime_id))
            .ok_or(SimError::EntityNotFound { runtime_id })?;
        entity.despawn();
        Ok(())
    }

    fn drain_inbound(&mut self) -> SimResult<()> {
        for inbound in self.funnel.drain() {
            let session = inbound.session;
            if let Err(error) = interact::handle_message(self, inbound) {
                match error {
                    SimError::ProtocolViolation { message } => {
                        log::warn!("{} violated the protocol: {}", session, message);
                        self.drop_player_session(session);
                        self.outbound
                            .disconnect(session, DisconnectReason::ProtocolViolation(message));
                    }
                    SimError::SessionNotFound { .. } | SimError::PlayerNotFound { .. } => {
                        log::warn!("Dropping {}: no player bound", session);
                        self.outbound.disconnect(
                            session,
                            DisconnectReason::ProtocolViolation(
                                "no player bound to session".to_string(),
                            ),
                        );
                    }
                    SimError::EntityNotFound { runtime_id } => {
                        // Races against despawn are routine, not hostile
                        log::debug!("{} addressed missing entity {}", session, runtime_id);
                    }
                    other => return Err(other),
                }
            }
        }
        Ok(())
    }

    /// Despawn a player's entity and release its session
    pub(super) fn drop_player_session(&mut self, session: SessionId) {
        for dimension in self.dimensions.values_mut() {
            if let Some(runtime_id) = dimension.player_by_session(session) {
                if let Some(entity) = dimension.entity_mut(runtime_id) {
                    entity.despawn();
                }
            }
        }
        self.sessions.close(session);
    }

    fn tick_entities(&mut self, dimension_id: &str) -> SimResult<()> {
        let simulation_distance = self.config.simulation_distance;
        let Some(dimension) = self.dimensions.get_mut(dimension_id) else {
            return Ok(());
        };
        let player_positions: Vec<glam::Vec3> = dimension
            .entities()
            .filter(|entity| entity.is_player())
            .map(|entity| entity.position)
            .collect();

        let (players, others): (Vec<u64>, Vec<u64>) =
            dimension.runtime_ids().into_iter().partition(|id| {
                dimension
                    .entity(*id)
                    .map(Entity::is_player)
                    .unwrap_or(false)
            });

        for runtime_id in players.into_iter().chain(others) {
            let Some(entity) = dimension.entity(runtime_id) else {
                continue;
            };
            if entity.pending_despawn {
                continue;
            }
            if !entity.is_player() {
                let in_range = player_positions.iter().any(|position| {
                    sync::within_chunk_distance(entity.position, *position, simulation_distance)
                });
                if !in_range {
                    continue;
                }
            }
            let Some(mut entity) = dimension.take_entity(runtime_id) else {
                continue;
            };
            let mut ctx = TickContext {
                current_tick: self.current_tick,
                config: &self.config,
                registries: &self.registries,
                components: &self.component_registry,
                outbound: &mut self.outbound,
            };
            if let Err(error) = dispatch::tick_entity_components(&mut entity, &mut ctx) {
                log::error!(
                    "Tick hook failed for '{}' ({}): {}",
                    entity.identifier(),
                    runtime_id,
                    error
                );
            }
            dimension.put_entity(entity);
        }
        Ok(())
    }

    fn tick_blocks(&mut self, dimension_id: &str) -> SimResult<()> {
        let simulation_distance = self.config.simulation_distance;
        let Some(dimension) = self.dimensions.get_mut(dimension_id) else {
            return Ok(());
        };
        let player_positions: Vec<glam::Vec3> = dimension
            .entities()
            .filter(|entity| entity.is_player())
            .map(|entity| entity.position)
            .collect();

        for position in dimension.block_positions() {
            let center = position.center();
            let in_range = player_positions.iter().any(|player| {
                sync::within_chunk_distance(center, *player, simulation_distance)
            });
            if !in_range {
                continue;
            }
            let Some(entry) = dimension.block_at_mut(position) else {
                continue;
            };
            let mut ctx = TickContext {
                current_tick: self.current_tick,
                config: &self.config,
                registries: &self.registries,
                components: &self.component_registry,
                outbound: &mut self.outbound,
            };
            if let Err(error) = dispatch::tick_block_components(entry, &mut ctx) {
                log::error!("Tick hook failed for block at {}: {}", position, error);
            }
        }
        Ok(())
    }

    /// Move ready item entities into the inventories of players
    /// standing on them. A stack that does not fully fit leaves its
    /// remainder on the ground.
    fn sweep_item_pickups(&mut self, dimension_id: &str) -> SimResult<()> {
        let current_tick = self.current_tick;
        let Some(dimension) = self.dimensions.get_mut(dimension_id) else {
            return Ok(());
        };

        for runtime_id in dimension.runtime_ids() {
            let Some(entity) = dimension.entity(runtime_id) else {
                continue;
            };
            if entity.pending_despawn {
                continue;
            }
            let ready = entity
                .components
                .get_as::<ItemEntityComponent>(ItemEntityComponent::IDENTIFIER)
                .map(|item| item.pickup_ready(current_tick))
                .unwrap_or(false);
            if !ready {
                continue;
            }
            let position = entity.position;
            let collector = dimension
                .entities()
                .filter(|player| player.is_player() && !player.pending_despawn)
                .find(|player| player.position.distance_squared(position) <= PICKUP_RANGE_SQ)
                .and_then(|player| {
                    player
                        .session()
                        .map(|session| (player.runtime_id(), session))
                });
            let Some((collector_id, collector_session)) = collector else {
                continue;
            };

            let Some(mut item_entity) = dimension.take_entity(runtime_id) else {
                continue;
            };
            let stack = item_entity
                .components
                .get_as_mut::<ItemEntityComponent>(ItemEntityComponent::IDENTIFIER)
                .and_then(ItemEntityComponent::take_stack);
            let Some(stack) = stack else {
                dimension.put_entity(item_entity);
                continue;
            };

            let remainder = match dimension
                .entity_mut(collector_id)
                .and_then(|player| player.player.as_mut())
            {
                Some(data) => data.inventory.add_item(stack),
                None => Some(stack),
            };
            match remainder {
                None => {
                    let mut recipients: BTreeSet<SessionId> =
                        item_entity.observers.iter().copied().collect();
                    recipients.insert(collector_session);
                    self.outbound.send_many(
                        recipients,
                        SyncMessage::PickupItem {
                            item_runtime_id: runtime_id,
                            collector_runtime_id: collector_id,
                        },
                    );
                    item_entity.despawn();
                    dimension.put_entity(item_entity);
                }
                Some(rest) => {
                    if let Some(item) = item_entity
                        .components
                        .get_as_mut::<ItemEntityComponent>(ItemEntityComponent::IDENTIFIER)
                    {
                        item.set_stack(rest, current_tick);
                    }
                    dimension.put_entity(item_entity);
                }
            }
        }
        Ok(())
    }

    fn sweep_despawns(&mut self, dimension_id: &str) -> SimResult<()> {
        let Some(dimension) = self.dimensions.get_mut(dimension_id) else {
            return Ok(());
        };
        let pending: Vec<u64> = dimension
            .entities()
            .filter(|entity| entity.pending_despawn)
            .map(Entity::runtime_id)
            .collect();

        for runtime_id in pending {
            let Some(mut entity) = dimension.take_entity(runtime_id) else {
                continue;
            };
            let mut ctx = TickContext {
                current_tick: self.current_tick,
                config: &self.config,
                registries: &self.registries,
                components: &self.component_registry,
                outbound: &mut self.outbound,
            };
            if let Err(error) = dispatch::despawn_entity_components(&mut entity, &mut ctx) {
                log::error!(
                    "Despawn hook failed for '{}' ({}): {}",
                    entity.identifier(),
                    runtime_id,
                    error
                );
            }
            let observers: Vec<SessionId> = entity.observers.iter().copied().collect();
            self.outbound
                .send_many(observers, SyncMessage::DespawnEntity { runtime_id });
            log::debug!(
                "Despawned '{}' runtime id {}",
                entity.identifier(),
                runtime_id
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::item::ItemStack;
    use crate::network::RecordingSink;
    use crate::world::OVERWORLD;
    use glam::Vec3;

    fn test_world() -> World {
        World::vanilla(SimulationConfig::default()).expect("vanilla world")
    }

    #[test]
    fn test_tick_advances_counter() {
        let mut world = test_world();
        let mut sink = RecordingSink::default();
        assert_eq!(world.current_tick(), 0);
        world.tick(&mut sink).expect("tick");
        world.tick(&mut sink).expect("tick");
        assert_eq!(world.current_tick(), 2);
    }

    #[test]
    fn test_nearby_player_collects_dropped_item() {
        let mut world = test_world();
        let session = world.sessions().open("steve");
        let player_id = world
            .spawn_player(OVERWORLD, session, Vec3::new(0.5, 64.0, 0.5))
            .expect("player");

        let apple_type = world
            .registries()
            .items
            .get("minecraft:apple")
            .expect("apple");
        // Drop from above the player's head so the stack is still in
        // reach once the pickup delay runs out, despite falling freely
        let item_id = world
            .spawn_item(
                OVERWORLD,
                ItemStack::new(apple_type, 3),
                Vec3::new(0.5, 65.0, 0.5),
                Vec3::ZERO,
            )
            .expect("item");

        let mut sink = RecordingSink::default();
        // The pickup delay holds the item on the ground first
        for _ in 0..9 {
            world.tick(&mut sink).expect("tick");
            assert!(world.overworld().entity(item_id).is_some());
        }
        world.tick(&mut sink).expect("tick");
        assert!(world.overworld().entity(item_id).is_none());

        let player = world.overworld().entity(player_id).expect("player");
        let data = player.player.as_ref().expect("player data");
        let held: i32 = data
            .inventory
            .snapshot()
            .iter()
            .flatten()
            .filter(|stack| stack.identifier() == "minecraft:apple")
            .map(|stack| stack.amount())
            .sum();
        assert_eq!(held, 3);

        assert!(sink
            .sent
            .iter()
            .any(|(_, message)| matches!(message, SyncMessage::PickupItem { .. })));
    }

    #[test]
    fn test_marked_entity_despawns_on_next_tick() {
        let mut world = test_world();
        let session = world.sessions().open("steve");
        world
            .spawn_player(OVERWORLD, session, Vec3::new(0.5, 64.0, 0.5))
            .expect("player");
        let zombie_id = world
            .spawn_entity(OVERWORLD, "minecraft:zombie", Vec3::new(4.0, 64.0, 4.0))
            .expect("zombie");

        let mut sink = RecordingSink::default();
        world.tick(&mut sink).expect("tick");
        world.despawn_entity(OVERWORLD, zombie_id).expect("mark");
        world.tick(&mut sink).expect("tick");
        assert!(world.overworld().entity(zombie_id).is_none());
        assert!(sink.sent.iter().any(|(_, message)| matches!(
            message,
            SyncMessage::DespawnEntity { runtime_id } if *runtime_id == zombie_id
        )));
    }

    #[test]
    fn test_unknown_entity_despawn_errors() {
        let mut world = test_world();
        assert!(matches!(
            world.despawn_entity(OVERWORLD, 999),
            Err(SimError::EntityNotFound { runtime_id: 999 })
        ));
    }
}
