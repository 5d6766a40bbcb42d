//! Per-owner component storage
//!
//! An ordered arena of boxed component instances plus an identifier
//! index. Iteration order is registration order, which follows the
//! type's binding order, so dispatch is deterministic across runs.

use rustc_hash::FxHashMap;

use super::Component;

pub struct ComponentSet<T: ?Sized> {
    entries: Vec<Box<T>>,
    index: FxHashMap<&'static str, usize>,
}

impl<T: ?Sized> Default for ComponentSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for ComponentSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut identifiers: Vec<&&'static str> = self.index.keys().collect();
        identifiers.sort();
        f.debug_struct("ComponentSet")
            .field("identifiers", &identifiers)
            .finish()
    }
}

impl<T: Component + ?Sized> ComponentSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a component. A second registration under the same identifier
    /// replaces the existing instance in place, keeping its position in
    /// the dispatch order; the replaced instance is returned.
    pub fn register(&mut self, component: Box<T>) -> Option<Box<T>> {
        let identifier = component.identifier();
        match self.index.get(identifier) {
            Some(&slot) => {
                let previous = std::mem::replace(&mut self.entries[slot], component);
                log::debug!("Replaced component instance '{}'", identifier);
                Some(previous)
            }
            None => {
                self.index.insert(identifier, self.entries.len());
                self.entries.push(component);
                None
            }
        }
    }

    pub fn has(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&T> {
        self.index
            .get(identifier)
            .map(|&slot| self.entries[slot].as_ref())
    }

    pub fn get_mut(&mut self, identifier: &str) -> Option<&mut T> {
        match self.index.get(identifier) {
            Some(&slot) => Some(self.entries[slot].as_mut()),
            None => None,
        }
    }

    /// Typed lookup for call sites that know the concrete component
    pub fn get_as<C: Component>(&self, identifier: &str) -> Option<&C> {
        self.get(identifier)?.as_any().downcast_ref()
    }

    pub fn get_as_mut<C: Component>(&mut self, identifier: &str) -> Option<&mut C> {
        self.get_mut(identifier)?.as_any_mut().downcast_mut()
    }

    /// Remove a component, preserving the relative order of the rest
    pub fn remove(&mut self, identifier: &str) -> Option<Box<T>> {
        let slot = self.index.remove(identifier)?;
        let removed = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    pub fn identifiers(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.identifier()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().map(|entry| entry.as_mut())
    }

    /// Consume the set, yielding the instances in registration order
    pub fn into_entries(self) -> Vec<Box<T>> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use std::any::Any;

    struct Counter {
        id: &'static str,
        value: i32,
    }

    impl Component for Counter {
        fn identifier(&self) -> &'static str {
            self.id
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Marker;

    impl Component for Marker {
        fn identifier(&self) -> &'static str {
            "test:marker"
        }

        fn kind(&self) -> ComponentKind {
            ComponentKind::Generic
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn counter(id: &'static str, value: i32) -> Box<dyn Component> {
        Box::new(Counter { id, value })
    }

    #[test]
    fn test_registration_order_is_iteration_order() {
        let mut set: ComponentSet<dyn Component> = ComponentSet::new();
        set.register(counter("test:b", 1));
        set.register(counter("test:a", 2));
        set.register(Box::new(Marker));
        assert_eq!(set.identifiers(), vec!["test:b", "test:a", "test:marker"]);
    }

    #[test]
    fn test_replacement_keeps_position_and_returns_previous() {
        let mut set: ComponentSet<dyn Component> = ComponentSet::new();
        set.register(counter("test:a", 1));
        set.register(counter("test:b", 2));
        let previous = set.register(counter("test:a", 3));
        assert!(previous.is_some());
        assert_eq!(set.identifiers(), vec!["test:a", "test:b"]);
        let replaced = set.get_as::<Counter>("test:a").expect("present");
        assert_eq!(replaced.value, 3);
    }

    #[test]
    fn test_typed_lookup_rejects_wrong_type() {
        let mut set: ComponentSet<dyn Component> = ComponentSet::new();
        set.register(Box::new(Marker));
        assert!(set.get_as::<Counter>("test:marker").is_none());
        assert!(set.get_as::<Marker>("test:marker").is_some());
    }

    #[test]
    fn test_remove_reindexes_later_entries() {
        let mut set: ComponentSet<dyn Component> = ComponentSet::new();
        set.register(counter("test:a", 1));
        set.register(counter("test:b", 2));
        set.register(counter("test:c", 3));
        assert!(set.remove("test:b").is_some());
        assert_eq!(set.identifiers(), vec!["test:a", "test:c"]);
        assert_eq!(set.get_as::<Counter>("test:c").map(|c| c.value), Some(3));
        assert!(!set.has("test:b"));
    }

    #[test]
    fn test_mutation_through_typed_access() {
        let mut set: ComponentSet<dyn Component> = ComponentSet::new();
        set.register(counter("test:a", 1));
        if let Some(entry) = set.get_as_mut::<Counter>("test:a") {
            entry.value += 10;
        }
        assert_eq!(set.get_as::<Counter>("test:a").map(|c| c.value), Some(11));
    }
}
