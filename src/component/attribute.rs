//! Bounded numeric attributes
//!
//! Attributes live in a map on the owning entity so effects, food,
//! damage and interaction paths all mutate the same entries. A value set
//! outside the inclusive `[effective_min, effective_max]` range resets
//! to the default value rather than clamping to the violated bound; the
//! protocol this feeds has no partial attribute update, so any change
//! marks the whole map for a full-list resync.

use rustc_hash::FxHashMap;

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKind {
    Health,
    MovementSpeed,
    Hunger,
    Saturation,
    Exhaustion,
}

impl AttributeKind {
    /// Protocol-level attribute name
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Health => "minecraft:health",
            AttributeKind::MovementSpeed => "minecraft:movement",
            AttributeKind::Hunger => "minecraft:player.hunger",
            AttributeKind::Saturation => "minecraft:player.saturation",
            AttributeKind::Exhaustion => "minecraft:player.exhaustion",
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    kind: AttributeKind,
    effective_min: f32,
    effective_max: f32,
    default_value: f32,
    current: f32,
}

impl Attribute {
    /// A fresh attribute starts at its default value
    pub fn new(kind: AttributeKind, effective_min: f32, effective_max: f32, default_value: f32) -> Self {
        Self {
            kind,
            effective_min,
            effective_max,
            default_value,
            current: default_value,
        }
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn effective_min(&self) -> f32 {
        self.effective_min
    }

    pub fn effective_max(&self) -> f32 {
        self.effective_max
    }

    pub fn default_value(&self) -> f32 {
        self.default_value
    }

    pub fn current_value(&self) -> f32 {
        self.current
    }

    /// Apply the range policy: an in-range value sticks, an out-of-range
    /// value resets to the default. Returns the value that took effect.
    pub fn set_current_value(&mut self, value: f32) -> f32 {
        self.current = if value < self.effective_min || value > self.effective_max {
            self.default_value
        } else {
            value
        };
        self.current
    }

    pub fn reset_to_default(&mut self) -> f32 {
        self.current = self.default_value;
        self.current
    }

    pub fn reset_to_min(&mut self) -> f32 {
        self.current = self.effective_min;
        self.current
    }

    pub fn reset_to_max(&mut self) -> f32 {
        self.current = self.effective_max;
        self.current
    }
}

/// Insertion-ordered attribute storage with a full-list dirty marker
#[derive(Debug, Default)]
pub struct AttributeMap {
    entries: Vec<Attribute>,
    index: FxHashMap<AttributeKind, usize>,
    dirty: bool,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has(&self, kind: AttributeKind) -> bool {
        self.index.contains_key(&kind)
    }

    /// Install or replace an attribute template
    pub fn apply(&mut self, attribute: Attribute) {
        let kind = attribute.kind();
        match self.index.get(&kind) {
            Some(&slot) => self.entries[slot] = attribute,
            None => {
                self.index.insert(kind, self.entries.len());
                self.entries.push(attribute);
            }
        }
        self.dirty = true;
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&Attribute> {
        self.index.get(&kind).map(|&slot| &self.entries[slot])
    }

    pub fn current_value(&self, kind: AttributeKind) -> Option<f32> {
        self.get(kind).map(Attribute::current_value)
    }

    pub fn set_current_value(&mut self, kind: AttributeKind, value: f32) -> SimResult<f32> {
        let applied = self.entry_mut(kind)?.set_current_value(value);
        self.dirty = true;
        Ok(applied)
    }

    /// Shift the current value by `delta`, subject to the range policy
    pub fn modify(&mut self, kind: AttributeKind, delta: f32) -> SimResult<f32> {
        let entry = self.entry_mut(kind)?;
        let applied = entry.set_current_value(entry.current_value() + delta);
        self.dirty = true;
        Ok(applied)
    }

    pub fn reset_to_default(&mut self, kind: AttributeKind) -> SimResult<f32> {
        let applied = self.entry_mut(kind)?.reset_to_default();
        self.dirty = true;
        Ok(applied)
    }

    pub fn reset_to_min(&mut self, kind: AttributeKind) -> SimResult<f32> {
        let applied = self.entry_mut(kind)?.reset_to_min();
        self.dirty = true;
        Ok(applied)
    }

    pub fn reset_to_max(&mut self, kind: AttributeKind) -> SimResult<f32> {
        let applied = self.entry_mut(kind)?.reset_to_max();
        self.dirty = true;
        Ok(applied)
    }

    pub fn remove(&mut self, kind: AttributeKind) -> Option<Attribute> {
        let slot = self.index.remove(&kind)?;
        let removed = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        self.dirty = true;
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    /// Full-list copy in insertion order, the shape every sync message
    /// carries
    pub fn snapshot(&self) -> Vec<Attribute> {
        self.entries.clone()
    }

    /// True when any entry changed since the last drain
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drop pending sync state, used while assembling a fresh owner
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn entry_mut(&mut self, kind: AttributeKind) -> SimResult<&mut Attribute> {
        match self.index.get(&kind) {
            Some(&slot) => Ok(&mut self.entries[slot]),
            None => Err(SimError::ComponentMissing {
                owner: "attribute map".to_string(),
                identifier: kind.as_str().to_string(),
            }),
        }
    }
}
