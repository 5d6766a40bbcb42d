//! Outbound state synchronization
//!
//! Three delivery paths feed the queue: join state pushed once when a
//! player spawns, observer reconciliation as entities move in and out
//! of view range, and the per-tick flush of dirty attribute, metadata,
//! flag and ability maps. Dirty bits are consumed here whether or not
//! anyone is listening, so an unobserved entity does not accumulate
//! stale sends for its first observer.

use glam::Vec3;

use super::Dimension;
use crate::component::entity::ItemEntityComponent;
use crate::component::{MetadataKey, MetadataValue};
use crate::entity::Entity;
use crate::network::{OutboundQueue, SessionId, SyncMessage, WINDOW_INVENTORY};

fn chunk_coords(position: Vec3) -> (i32, i32) {
    (
        (position.x.floor() as i32) >> 4,
        (position.z.floor() as i32) >> 4,
    )
}

/// Chebyshev chunk distance check used for both view and simulation
/// range
pub(super) fn within_chunk_distance(a: Vec3, b: Vec3, distance: u32) -> bool {
    let (ax, az) = chunk_coords(a);
    let (bx, bz) = chunk_coords(b);
    let dx = (ax - bx).abs();
    let dz = (az - bz).abs();
    dx.max(dz) <= distance as i32
}

/// Push a freshly spawned player's complete state to its own client.
/// Dirty bits are cleared afterwards so the first tick does not repeat
/// the same state.
pub(super) fn send_player_join_state(entity: &mut Entity, outbound: &mut OutboundQueue) {
    let runtime_id = entity.runtime_id();
    let Some(data) = entity.player.as_mut() else {
        return;
    };
    let session = data.session();

    entity.metadata.set(
        MetadataKey::Nametag,
        MetadataValue::String(data.username().to_string()),
    );

    outbound.send(
        session,
        SyncMessage::GamemodeChange {
            runtime_id,
            gamemode: data.gamemode,
        },
    );
    outbound.send(
        session,
        SyncMessage::AbilitySet {
            runtime_id,
            abilities: data.abilities.snapshot(),
        },
    );
    outbound.send(
        session,
        SyncMessage::AttributeList {
            runtime_id,
            attributes: entity.attributes.snapshot(),
        },
    );
    outbound.send(
        session,
        SyncMessage::ActorData {
            runtime_id,
            metadata: entity.metadata.snapshot(),
            flags: entity.flags.packed(),
        },
    );
    outbound.send(
        session,
        SyncMessage::ContainerContent {
            window: WINDOW_INVENTORY,
            stacks: data.inventory.snapshot(),
        },
    );

    entity.attributes.clear_dirty();
    entity.metadata.clear_dirty();
    entity.flags.clear_dirty();
    data.abilities.take_dirty();
}

/// Initial state sent when an entity enters a player's view
fn send_entity_state(entity: &Entity, session: SessionId, outbound: &mut OutboundQueue) {
    let stack = entity
        .components
        .get_as::<ItemEntityComponent>(ItemEntityComponent::IDENTIFIER)
        .and_then(|item| item.stack().cloned());
    outbound.send(
        session,
        SyncMessage::SpawnEntity {
            runtime_id: entity.runtime_id(),
            unique_id: entity.unique_id(),
            identifier: entity.identifier().to_string(),
            position: entity.position,
            stack,
        },
    );
    outbound.send(
        session,
        SyncMessage::AttributeList {
            runtime_id: entity.runtime_id(),
            attributes: entity.attributes.snapshot(),
        },
    );
    outbound.send(
        session,
        SyncMessage::ActorData {
            runtime_id: entity.runtime_id(),
            metadata: entity.metadata.snapshot(),
            flags: entity.flags.packed(),
        },
    );
}

/// Walk every entity against every player and settle observer sets.
/// Entering view sends spawn plus initial state, leaving view sends a
/// despawn.
pub(super) fn reconcile_observers(
    dimension: &mut Dimension,
    view_distance: u32,
    outbound: &mut OutboundQueue,
) {
    let players: Vec<(u64, SessionId, Vec3)> = dimension
        .entities()
        .filter_map(|entity| {
            entity
                .session()
                .map(|session| (entity.runtime_id(), session, entity.position))
        })
        .collect();

    for runtime_id in dimension.runtime_ids() {
        let Some(entity) = dimension.entity_mut(runtime_id) else {
            continue;
        };
        for (player_id, session, player_position) in &players {
            if *player_id == runtime_id {
                continue;
            }
            let in_range =
                within_chunk_distance(entity.position, *player_position, view_distance);
            if in_range && !entity.observers.contains(session) {
                entity.observers.insert(*session);
                send_entity_state(entity, *session, outbound);
            } else if !in_range && entity.observers.contains(session) {
                entity.observers.remove(session);
                outbound.send(*session, SyncMessage::DespawnEntity { runtime_id });
            }
        }
    }
}

/// Flush changed attribute, metadata, flag and ability state to every
/// observer plus the owning player
pub(super) fn flush_dirty_state(dimension: &mut Dimension, outbound: &mut OutboundQueue) {
    for runtime_id in dimension.runtime_ids() {
        let Some(entity) = dimension.entity_mut(runtime_id) else {
            continue;
        };
        let mut recipients: Vec<SessionId> = entity.observers.iter().copied().collect();
        if let Some(session) = entity.session() {
            recipients.push(session);
        }

        let attributes_dirty = entity.attributes.take_dirty();
        let metadata_dirty = entity.metadata.take_dirty();
        let flags_dirty = entity.flags.take_dirty();
        if recipients.is_empty() {
            continue;
        }

        if attributes_dirty {
            outbound.send_many(
                recipients.iter().copied(),
                SyncMessage::AttributeList {
                    runtime_id,
                    attributes: entity.attributes.snapshot(),
                },
            );
        }
        if metadata_dirty || flags_dirty {
            outbound.send_many(
                recipients.iter().copied(),
                SyncMessage::ActorData {
                    runtime_id,
                    metadata: entity.metadata.snapshot(),
                    flags: entity.flags.packed(),
                },
            );
        }
        if let Some(data) = entity.player.as_mut() {
            if data.abilities.take_dirty() {
                outbound.send_many(
                    recipients.iter().copied(),
                    SyncMessage::AbilitySet {
                        runtime_id,
                        abilities: data.abilities.snapshot(),
                    },
                );
            }
        }
    }
}
