//! Scripted offline session
//!
//! Drives the simulation core without a transport: one player joins,
//! builds, opens a chest, shuffles items through stack requests, eats,
//! and mines a block back out of the world. Every sync message the
//! server would put on the wire is printed instead.

use anyhow::Result;
use glam::Vec3;

use embercraft::container::transaction::{ContainerName, RequestAction, SlotRef, StackRequest};
use embercraft::item::ItemStack;
use embercraft::network::{
    ClientMessage, DisconnectReason, PacketSink, SessionId, SyncMessage, UI_CURSOR_SLOT,
};
use embercraft::position::{BlockFace, BlockPosition};
use embercraft::{SimulationConfig, World, OVERWORLD};

/// Sink that narrates the outbound traffic
struct ConsoleSink;

impl PacketSink for ConsoleSink {
    fn send(&mut self, session: SessionId, message: SyncMessage) {
        println!("  -> {}: {:?}", session, message);
    }

    fn disconnect(&mut self, session: SessionId, reason: DisconnectReason) {
        println!("  !! {} disconnected: {}", session, reason);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut world = World::vanilla(SimulationConfig::default())?;
    let mut sink = ConsoleSink;
    let handle = world.handle();

    println!("== join");
    let session = world.sessions().open("steve");
    let player_id = world.spawn_player(OVERWORLD, session, Vec3::new(0.5, 64.0, 0.5))?;
    world.tick(&mut sink)?;

    println!("== give dirt and place a block");
    {
        let dirt = world
            .registries()
            .items
            .get("minecraft:dirt")
            .expect("vanilla dirt");
        let entity = world
            .overworld_mut()
            .entity_mut(player_id)
            .expect("player entity");
        let data = entity.player.as_mut().expect("player data");
        data.inventory.set_item(0, ItemStack::new(dirt, 16))?;
    }
    let base = BlockPosition::new(0, 63, 1);
    world.set_block(OVERWORLD, base, "minecraft:stone")?;
    handle.submit(
        session,
        ClientMessage::UseItemOn {
            position: base,
            face: BlockFace::Top,
        },
    )?;
    world.tick(&mut sink)?;

    println!("== open a chest and stash five dirt");
    let chest_at = BlockPosition::new(2, 64, 0);
    world.set_block(OVERWORLD, chest_at, "minecraft:chest")?;
    handle.submit(
        session,
        ClientMessage::UseItemOn {
            position: chest_at,
            face: BlockFace::North,
        },
    )?;
    world.tick(&mut sink)?;

    handle.submit(
        session,
        ClientMessage::StackRequests(vec![StackRequest {
            request_id: 1,
            actions: vec![
                RequestAction::Take {
                    count: 5,
                    source: SlotRef::new(ContainerName::HotbarAndInventory, 0),
                    destination: SlotRef::new(ContainerName::Cursor, UI_CURSOR_SLOT as u8),
                },
                RequestAction::Place {
                    count: 5,
                    source: SlotRef::new(ContainerName::Cursor, UI_CURSOR_SLOT as u8),
                    destination: SlotRef::new(ContainerName::Opened, 0),
                },
            ],
        }]),
    )?;
    world.tick(&mut sink)?;
    handle.submit(session, ClientMessage::CloseContainer { window: 1 })?;
    world.tick(&mut sink)?;

    println!("== eat an apple");
    {
        let apple = world
            .registries()
            .items
            .get("minecraft:apple")
            .expect("vanilla apple");
        let entity = world
            .overworld_mut()
            .entity_mut(player_id)
            .expect("player entity");
        let data = entity.player.as_mut().expect("player data");
        data.inventory.set_item(1, ItemStack::new(apple, 1))?;
        data.select_slot(1)?;
        // An empty stomach so the bite counts
        entity
            .attributes
            .set_current_value(embercraft::component::AttributeKind::Hunger, 6.0)?;
    }
    handle.submit(
        session,
        ClientMessage::UseItem {
            cause: embercraft::component::UseCause::Click,
        },
    )?;
    world.tick(&mut sink)?;
    for _ in 0..30 {
        world.tick(&mut sink)?;
    }
    handle.submit(
        session,
        ClientMessage::UseItem {
            cause: embercraft::component::UseCause::Click,
        },
    )?;
    world.tick(&mut sink)?;

    println!("== mine the placed dirt back out");
    let placed = BlockPosition::new(0, 64, 1);
    handle.submit(session, ClientMessage::StartBreak { position: placed })?;
    world.tick(&mut sink)?;
    for _ in 0..50 {
        world.tick(&mut sink)?;
    }
    handle.submit(session, ClientMessage::StopBreak { position: placed })?;
    world.tick(&mut sink)?;
    // Walk a few ticks so the drop's pickup delay expires on our head
    for _ in 0..12 {
        world.tick(&mut sink)?;
    }

    println!("== quit");
    handle.submit(session, ClientMessage::Disconnect)?;
    world.tick(&mut sink)?;
    world.tick(&mut sink)?;

    println!("done after {} ticks", world.current_tick());
    Ok(())
}
