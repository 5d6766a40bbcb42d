//! Built-in block components
//!
//! Chests get a backing container plus viewer bookkeeping; every
//! breakable block gets mining-progress verification. Placement,
//! removal and the messages that announce them stay with the world;
//! these hooks manage only the state living on the block entry.

use std::any::Any;
use std::collections::BTreeMap;

use crate::component::{BlockComponent, Component};
use crate::container::{Container, ContainerLabel, CHEST_SIZE};
use crate::entity::Entity;
use crate::error::{SimError, SimResult};
use crate::item::{DiggerDefinition, ItemStack};
use crate::network::{SessionId, SyncMessage};
use crate::registry::{BlockType, RegistryEntry};
use crate::world::{BlockEntry, TickContext};

/// Backing container and viewer tracking for container blocks.
///
/// Construction is validated: binding this to a type without the
/// `container` tag fails, which surfaces as a placement error instead
/// of a chest with no storage.
#[derive(Debug, Default)]
pub struct ChestComponent {
    viewers: BTreeMap<SessionId, u8>,
}

impl ChestComponent {
    pub const IDENTIFIER: &'static str = "minecraft:inventory";

    pub fn try_new(block_type: &BlockType) -> SimResult<Self> {
        if !block_type.has_tag("container") {
            return Err(SimError::ComponentState {
                identifier: Self::IDENTIFIER.to_string(),
                reason: format!("{} does not carry the container tag", block_type.identifier()),
            });
        }
        Ok(Self {
            viewers: BTreeMap::new(),
        })
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    pub fn window_for(&self, session: SessionId) -> Option<u8> {
        self.viewers.get(&session).copied()
    }

    /// Forget a viewer, reporting the window id it was watching through
    pub fn remove_viewer(&mut self, session: SessionId) -> Option<u8> {
        self.viewers.remove(&session)
    }
}

impl Component for ChestComponent {
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

impl BlockComponent for ChestComponent {
    fn on_place(
        &mut self,
        block: &mut BlockEntry,
        _player: Option<&mut Entity>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<()> {
        if block.container.is_none() {
            let mut container = Container::new(ContainerLabel::Opened, CHEST_SIZE);
            if block.storage.get("Items").is_some() {
                container.load_nbt(&block.storage, &ctx.registries.items)?;
            }
            container.take_dirty();
            block.container = Some(container);
        }
        Ok(())
    }

    fn on_interact(
        &mut self,
        block: &mut BlockEntry,
        player: &mut Entity,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<()> {
        let Some(data) = player.player.as_mut() else {
            return Ok(());
        };
        let owner = block.identifier().to_string();
        let position = block.position();
        let container = block
            .container
            .as_mut()
            .ok_or(SimError::ContainerMissing {
                owner,
                name: "chest".to_string(),
            })?;
        let window = data.open_window(position);
        let session = data.session();
        self.viewers.insert(session, window);

        ctx.outbound.send(
            session,
            SyncMessage::OpenContainer {
                window,
                label: container.label(),
                position,
            },
        );
        // The full snapshot supersedes any pending slot updates
        container.take_dirty();
        ctx.outbound.send(
            session,
            SyncMessage::ContainerContent {
                window,
                stacks: container.snapshot(),
            },
        );
        Ok(())
    }

    fn on_tick(&mut self, block: &mut BlockEntry, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let Some(container) = block.container.as_mut() else {
            return Ok(());
        };
        let dirty = container.take_dirty();
        if dirty.is_empty() || self.viewers.is_empty() {
            return Ok(());
        }
        for slot in dirty {
            let stack = container.get_item(slot)?.cloned();
            for (&session, &window) in &self.viewers {
                ctx.outbound.send(
                    session,
                    SyncMessage::ContainerSlot {
                        window,
                        slot: slot as u32,
                        stack: stack.clone(),
                    },
                );
            }
        }
        Ok(())
    }

    fn on_break(
        &mut self,
        _block: &mut BlockEntry,
        _player: Option<&mut Entity>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<()> {
        for (&session, &window) in &self.viewers {
            ctx.outbound
                .send(session, SyncMessage::CloseContainer { window });
        }
        self.viewers.clear();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct BreakProgress {
    runtime_id: u64,
    started_tick: u64,
    required_ticks: u64,
}

/// Survival mining verification.
///
/// Start-break records who is mining and how long the block should
/// take given the tool in hand; the completion claim is checked against
/// that record with a small slack for tick skew.
#[derive(Debug, Default)]
pub struct BreakableComponent {
    in_progress: Option<BreakProgress>,
}

impl BreakableComponent {
    pub const IDENTIFIER: &'static str = "minecraft:breakable";
    /// Completion slack covering client/server tick skew
    const COMPLETION_SLACK_TICKS: u64 = 2;

    /// Ticks of mining this block needs with the given tool. `None`
    /// means the block cannot be mined at all.
    pub fn required_ticks(
        block_type: &BlockType,
        held: Option<&ItemStack>,
    ) -> SimResult<Option<u64>> {
        let hardness = block_type.hardness();
        if hardness < 0.0 {
            return Ok(None);
        }
        let digger = match held {
            Some(stack) => DiggerDefinition::from_components(stack.item_type().components())?,
            None => None,
        };
        let speed = digger.as_ref().and_then(|d| d.speed_against(block_type));
        let seconds = match speed {
            Some(speed) => hardness * 1.5 / speed.max(1) as f32,
            None => hardness * 5.0,
        };
        Ok(Some((seconds * 20.0).ceil() as u64))
    }

    /// Whether the recorded progress satisfies a completion claim now
    pub fn mining_satisfied(&self, runtime_id: u64, current_tick: u64) -> bool {
        match self.in_progress {
            Some(progress) => {
                progress.runtime_id == runtime_id
                    && current_tick + Self::COMPLETION_SLACK_TICKS
                        >= progress.started_tick + progress.required_ticks
            }
            None => false,
        }
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress.is_some()
    }
}

impl Component for BreakableComponent {
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

impl BlockComponent for BreakableComponent {
    fn on_start_break(
        &mut self,
        block: &mut BlockEntry,
        player: &mut Entity,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<()> {
        let held = player.player.as_ref().and_then(|data| data.held_item());
        match Self::required_ticks(block.block_type(), held)? {
            Some(required_ticks) => {
                self.in_progress = Some(BreakProgress {
                    runtime_id: player.runtime_id(),
                    started_tick: ctx.current_tick,
                    required_ticks,
                });
            }
            None => {
                log::debug!(
                    "Runtime id {} started mining unbreakable {}",
                    player.runtime_id(),
                    block.identifier()
                );
                self.in_progress = None;
            }
        }
        Ok(())
    }

    fn on_stop_break(
        &mut self,
        _block: &mut BlockEntry,
        _player: &mut Entity,
        _ctx: &mut TickContext<'_>,
    ) -> SimResult<()> {
        self.in_progress = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ItemType, Registries};

    #[test]
    fn test_chest_requires_container_tag() {
        let plain = BlockType::new("minecraft:stone", 1, 1.5);
        assert!(ChestComponent::try_new(&plain).is_err());

        let chest = BlockType::new("minecraft:chest", 54, 2.5).with_tags(&["wood", "container"]);
        assert!(ChestComponent::try_new(&chest).is_ok());
    }

    #[test]
    fn test_mining_time_scales_with_tool() {
        let registries = Registries::vanilla().expect("vanilla registries");
        let stone = registries.blocks.get("minecraft:stone").expect("stone");
        let pickaxe = ItemStack::new(
            registries.items.get("minecraft:iron_pickaxe").expect("pickaxe"),
            1,
        );

        // 1.5 hardness, speed 6 tool: 1.5 * 1.5 / 6 seconds = 8 ticks
        let with_tool = BreakableComponent::required_ticks(&stone, Some(&pickaxe))
            .expect("well formed")
            .expect("breakable");
        assert_eq!(with_tool, 8);

        // Bare hands: 1.5 * 5 seconds = 150 ticks
        let bare = BreakableComponent::required_ticks(&stone, None)
            .expect("well formed")
            .expect("breakable");
        assert_eq!(bare, 150);
    }

    #[test]
    fn test_unbreakable_blocks_report_none() {
        let bedrock = BlockType::new("minecraft:bedrock", 7, -1.0);
        let required =
            BreakableComponent::required_ticks(&bedrock, None).expect("well formed");
        assert_eq!(required, None);
    }

    #[test]
    fn test_completion_claim_checks_miner_and_elapsed() {
        let mut breakable = BreakableComponent::default();
        breakable.in_progress = Some(BreakProgress {
            runtime_id: 3,
            started_tick: 100,
            required_ticks: 30,
        });

        assert!(!breakable.mining_satisfied(3, 120));
        assert!(breakable.mining_satisfied(3, 128));
        assert!(breakable.mining_satisfied(3, 130));
        assert!(!breakable.mining_satisfied(4, 130));
    }
}
