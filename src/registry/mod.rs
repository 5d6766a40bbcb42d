//! Type registries
//!
//! Block, item and entity types are registered once and shared from then
//! on. A single generic registry underpins all three kinds: an identifier
//! index, a network-id index and the registration list in insertion order.
//! Registries are plain values owned by the world; nothing here is global.

mod block;
mod entity;
mod item;
mod vanilla;

pub use block::BlockType;
pub use entity::EntityType;
pub use item::ItemType;
pub use vanilla::Registries;

use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Implemented by every registrable type kind
pub trait RegistryEntry {
    /// Kind label used in logs and errors
    const KIND: &'static str;

    fn identifier(&self) -> &str;
    fn network_id(&self) -> i32;
}

/// Write-once registry over one type kind
pub struct TypeRegistry<T> {
    types: FxHashMap<String, Arc<T>>,
    network_index: FxHashMap<i32, Arc<T>>,
    registrations: Vec<Arc<T>>,
}

impl<T: RegistryEntry> TypeRegistry<T> {
    pub fn new() -> Self {
        Self {
            types: FxHashMap::default(),
            network_index: FxHashMap::default(),
            registrations: Vec::new(),
        }
    }

    /// Register a type. The first registration of an identifier wins;
    /// repeats (or a network-id collision) leave the registry untouched
    /// and return false.
    pub fn register(&mut self, value: T) -> bool {
        if self.types.contains_key(value.identifier()) {
            log::warn!(
                "Ignoring duplicate {} type registration: {}",
                T::KIND,
                value.identifier()
            );
            return false;
        }
        if self.network_index.contains_key(&value.network_id()) {
            log::warn!(
                "Ignoring {} type {} with colliding network id {}",
                T::KIND,
                value.identifier(),
                value.network_id()
            );
            return false;
        }

        let shared = Arc::new(value);
        self.types
            .insert(shared.identifier().to_string(), Arc::clone(&shared));
        self.network_index
            .insert(shared.network_id(), Arc::clone(&shared));
        self.registrations.push(Arc::clone(&shared));

        log::debug!(
            "Registered {} type '{}' with network id {}",
            T::KIND,
            shared.identifier(),
            shared.network_id()
        );
        true
    }

    /// Look up a type by identifier
    pub fn get(&self, identifier: &str) -> Option<Arc<T>> {
        self.types.get(identifier).cloned()
    }

    /// Look up a type by network id
    pub fn get_by_network_id(&self, network_id: i32) -> Option<Arc<T>> {
        self.network_index.get(&network_id).cloned()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.types.contains_key(identifier)
    }

    /// All registrations in insertion order
    pub fn all(&self) -> &[Arc<T>] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl<T: RegistryEntry> Default for TypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
