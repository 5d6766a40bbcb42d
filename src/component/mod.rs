//! Component framework
//!
//! Behavior attaches to live owners (entities, blocks in the world, item
//! stacks) as components. Each owner kind has its own hook trait; a
//! component implements only the hooks it cares about. Binding is data:
//! a component identifier maps to a factory, and every type identifier
//! maps to an ordered factory list that is instantiated when an owner of
//! that type is constructed.
//!
//! Numeric, keyed and boolean state does not live inside component
//! instances. Attributes, metadata and flags sit in maps on the owner so
//! any component (and the interaction paths) can reach them without
//! digging through sibling instances. Component instances carry only
//! their own private state, such as an effect table or mining progress.

pub mod attribute;
pub mod block;
pub mod entity;
pub mod item;
pub mod metadata;
pub mod player;
pub mod registry;
pub mod set;
pub mod vanilla;

use std::any::Any;

use crate::error::SimResult;
use crate::item::ItemStack;
use crate::position::BlockPosition;

pub use attribute::{Attribute, AttributeKind, AttributeMap};
pub use metadata::{ActorFlag, FlagMap, MetadataKey, MetadataMap, MetadataValue};
pub use registry::{
    BindingTable, BlockComponentFactory, ComponentRegistry, EntityComponentFactory,
    ItemComponentFactory,
};
pub use set::ComponentSet;
pub use vanilla::vanilla_bindings;

/// The flattened component taxonomy. Attribute, metadata and flag
/// components wrap one entry of the owner's corresponding map; generic
/// components are pure behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentKind {
    Generic,
    Attribute(AttributeKind),
    Metadata(MetadataKey),
    Flag(ActorFlag),
}

/// How an item ended up being used, reported back to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseMethod {
    Place,
    Eat,
    Consume,
    EquipArmor,
    Interact,
}

/// What triggered an item use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCause {
    Click,
    Hold,
}

/// How a player engaged another entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractKind {
    Interact,
    Attack,
}

/// Base contract shared by every component regardless of owner kind
pub trait Component: Any {
    /// Stable identifier, unique within one owner's component set
    fn identifier(&self) -> &'static str;

    /// Which of the flattened kinds this component is
    fn kind(&self) -> ComponentKind {
        ComponentKind::Generic
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Hooks available to components bound to entity types.
///
/// During dispatch the owner's component set is taken out, so hooks see
/// the owner with an empty set; cross-component state goes through the
/// owner's attribute/metadata/flag maps and containers instead.
pub trait EntityComponent: Component {
    fn on_spawn(
        &mut self,
        _entity: &mut crate::entity::Entity,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_despawn(
        &mut self,
        _entity: &mut crate::entity::Entity,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_interact(
        &mut self,
        _entity: &mut crate::entity::Entity,
        _player: &mut crate::entity::Entity,
        _kind: InteractKind,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_tick(
        &mut self,
        _entity: &mut crate::entity::Entity,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }
}

/// Hooks available to components bound to block types
pub trait BlockComponent: Component {
    fn on_place(
        &mut self,
        _block: &mut crate::world::BlockEntry,
        _player: Option<&mut crate::entity::Entity>,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_start_break(
        &mut self,
        _block: &mut crate::world::BlockEntry,
        _player: &mut crate::entity::Entity,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_stop_break(
        &mut self,
        _block: &mut crate::world::BlockEntry,
        _player: &mut crate::entity::Entity,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_break(
        &mut self,
        _block: &mut crate::world::BlockEntry,
        _player: Option<&mut crate::entity::Entity>,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_interact(
        &mut self,
        _block: &mut crate::world::BlockEntry,
        _player: &mut crate::entity::Entity,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_tick(
        &mut self,
        _block: &mut crate::world::BlockEntry,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }
}

/// Hooks available to components bound to item types.
///
/// Item component state persists in the stack's extra-data tree, so the
/// instances themselves are built fresh per dispatch from the type's
/// binding list and hold no state across calls.
pub trait ItemComponent: Component {
    /// First component returning a use method wins; later ones are not
    /// consulted.
    fn on_use(
        &mut self,
        _stack: &mut ItemStack,
        _player: &mut crate::entity::Entity,
        _cause: UseCause,
        _clicked: Option<BlockPosition>,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<Option<UseMethod>> {
        Ok(None)
    }

    fn on_start_use(
        &mut self,
        _stack: &mut ItemStack,
        _player: &mut crate::entity::Entity,
        _cause: UseCause,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_stop_use(
        &mut self,
        _stack: &mut ItemStack,
        _player: &mut crate::entity::Entity,
        _cause: UseCause,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_release(
        &mut self,
        _stack: &mut ItemStack,
        _player: &mut crate::entity::Entity,
        _ctx: &mut crate::world::TickContext<'_>,
    ) -> SimResult<()> {
        Ok(())
    }
}
