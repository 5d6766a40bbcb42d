//! Component binding tables
//!
//! Two maps per owner kind: a global component-identifier → factory map
//! and a type-identifier → ordered factory list. `bind` records the
//! factory once globally and appends it to every named type's list;
//! constructing an owner walks its type's list in binding order. All of
//! this is plain value state owned by whoever bootstraps the world, not
//! globals.

use rustc_hash::FxHashMap;

use super::set::ComponentSet;
use super::{BlockComponent, EntityComponent, ItemComponent};
use crate::error::SimResult;
use crate::registry::{BlockType, EntityType, ItemType, RegistryEntry};

pub type EntityComponentFactory = fn(&EntityType) -> SimResult<Box<dyn EntityComponent>>;
pub type BlockComponentFactory = fn(&BlockType) -> SimResult<Box<dyn BlockComponent>>;
pub type ItemComponentFactory = fn(&ItemType) -> SimResult<Box<dyn ItemComponent>>;

/// Binding state for one owner kind
pub struct BindingTable<F: Copy> {
    factories: FxHashMap<&'static str, F>,
    bindings: FxHashMap<String, Vec<(&'static str, F)>>,
}

impl<F: Copy> Default for BindingTable<F> {
    fn default() -> Self {
        Self {
            factories: FxHashMap::default(),
            bindings: FxHashMap::default(),
        }
    }
}

impl<F: Copy> BindingTable<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a component factory and append it to each named type's
    /// ordered list. Component identifiers are write-once: a second bind
    /// under the same identifier is rejected and returns false.
    pub fn bind(
        &mut self,
        identifier: &'static str,
        factory: F,
        type_identifiers: &[&str],
    ) -> bool {
        if self.factories.contains_key(identifier) {
            log::warn!(
                "Component '{}' is already bound, keeping the existing binding",
                identifier
            );
            return false;
        }
        self.factories.insert(identifier, factory);
        for type_identifier in type_identifiers {
            let list = self
                .bindings
                .entry((*type_identifier).to_string())
                .or_default();
            if list.iter().any(|(bound, _)| *bound == identifier) {
                continue;
            }
            list.push((identifier, factory));
        }
        log::debug!(
            "Bound component '{}' to {} type(s)",
            identifier,
            type_identifiers.len()
        );
        true
    }

    pub fn factory(&self, identifier: &str) -> Option<F> {
        self.factories.get(identifier).copied()
    }

    pub fn is_bound(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Ordered (identifier, factory) list bound to a type
    pub fn bound_to(&self, type_identifier: &str) -> &[(&'static str, F)] {
        self.bindings
            .get(type_identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// The binding tables for all three owner kinds
#[derive(Default)]
pub struct ComponentRegistry {
    pub entity: BindingTable<EntityComponentFactory>,
    pub block: BindingTable<BlockComponentFactory>,
    pub item: BindingTable<ItemComponentFactory>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the component set for a freshly constructed entity. A
    /// factory that rejects the type fails the whole construction.
    pub fn instantiate_entity(
        &self,
        entity_type: &EntityType,
    ) -> SimResult<ComponentSet<dyn EntityComponent>> {
        let mut set = ComponentSet::new();
        for (identifier, factory) in self.entity.bound_to(entity_type.identifier()) {
            let component = factory(entity_type)?;
            log::trace!(
                "Instantiated entity component '{}' for '{}'",
                identifier,
                entity_type.identifier()
            );
            set.register(component);
        }
        Ok(set)
    }

    /// Build the component set for a block placed into the world
    pub fn instantiate_block(
        &self,
        block_type: &BlockType,
    ) -> SimResult<ComponentSet<dyn BlockComponent>> {
        let mut set = ComponentSet::new();
        for (identifier, factory) in self.block.bound_to(block_type.identifier()) {
            let component = factory(block_type)?;
            log::trace!(
                "Instantiated block component '{}' for '{}'",
                identifier,
                block_type.identifier()
            );
            set.register(component);
        }
        Ok(set)
    }

    /// Build the transient component list for one item dispatch. Item
    /// component state lives in the stack's extra data, so instances do
    /// not persist between dispatches.
    pub fn instantiate_item(
        &self,
        item_type: &ItemType,
    ) -> SimResult<Vec<Box<dyn ItemComponent>>> {
        let mut components = Vec::new();
        for (_, factory) in self.item.bound_to(item_type.identifier()) {
            components.push(factory(item_type)?);
        }
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use std::any::Any;

    struct Tracer {
        label: &'static str,
    }

    impl Component for Tracer {
        fn identifier(&self) -> &'static str {
            self.label
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl EntityComponent for Tracer {}

    fn first_factory(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
        Ok(Box::new(Tracer { label: "test:first" }))
    }

    fn second_factory(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
        Ok(Box::new(Tracer { label: "test:second" }))
    }

    fn failing_factory(_: &EntityType) -> SimResult<Box<dyn EntityComponent>> {
        Err(crate::error::SimError::ComponentState {
            identifier: "test:failing".to_string(),
            reason: "type lacks required state".to_string(),
        })
    }

    #[test]
    fn test_bind_is_write_once() {
        let mut table: BindingTable<EntityComponentFactory> = BindingTable::new();
        assert!(table.bind("test:first", first_factory, &["minecraft:pig"]));
        assert!(!table.bind("test:first", second_factory, &["minecraft:cow"]));
        assert_eq!(table.bound_to("minecraft:pig").len(), 1);
        assert!(table.bound_to("minecraft:cow").is_empty());
    }

    #[test]
    fn test_instantiation_follows_binding_order() {
        let mut registry = ComponentRegistry::new();
        registry
            .entity
            .bind("test:second", second_factory, &["minecraft:pig"]);
        registry
            .entity
            .bind("test:first", first_factory, &["minecraft:pig"]);

        let pig = EntityType::new("minecraft:pig", 12);
        let set = registry.instantiate_entity(&pig).expect("factories succeed");
        assert_eq!(set.identifiers(), vec!["test:second", "test:first"]);
    }

    #[test]
    fn test_failing_factory_rejects_construction() {
        let mut registry = ComponentRegistry::new();
        registry
            .entity
            .bind("test:first", first_factory, &["minecraft:pig"]);
        registry
            .entity
            .bind("test:failing", failing_factory, &["minecraft:pig"]);

        let pig = EntityType::new("minecraft:pig", 12);
        assert!(registry.instantiate_entity(&pig).is_err());
    }

    #[test]
    fn test_unbound_type_instantiates_empty() {
        let registry = ComponentRegistry::new();
        let cow = EntityType::new("minecraft:cow", 11);
        let set = registry.instantiate_entity(&cow).expect("empty set");
        assert!(set.is_empty());
    }
}
