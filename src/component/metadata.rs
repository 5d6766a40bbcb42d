//! Actor metadata and flags
//!
//! Metadata entries are small typed values keyed by a protocol data id;
//! boolean flags pack into one shared bit set carried alongside the
//! metadata in the same actor-data message. Both resync as a full
//! snapshot, never as a delta.

use bit_vec::BitVec;
use glam::Vec3;
use rustc_hash::FxHashMap;

/// Protocol data ids for keyed metadata entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataKey {
    Variant,
    Nametag,
    AirSupply,
    EffectColor,
    Scale,
    Width,
    Height,
}

impl MetadataKey {
    pub fn data_id(&self) -> u32 {
        match self {
            MetadataKey::Variant => 2,
            MetadataKey::Nametag => 4,
            MetadataKey::AirSupply => 7,
            MetadataKey::EffectColor => 8,
            MetadataKey::Scale => 38,
            MetadataKey::Width => 53,
            MetadataKey::Height => 54,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    String(String),
    Vector(Vec3),
}

/// Bit positions in the shared actor flag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActorFlag {
    OnFire,
    Sneaking,
    Sprinting,
    UsingItem,
    Invisible,
    Breathing,
    HasGravity,
}

impl ActorFlag {
    pub fn bit(&self) -> usize {
        match self {
            ActorFlag::OnFire => 0,
            ActorFlag::Sneaking => 1,
            ActorFlag::Sprinting => 3,
            ActorFlag::UsingItem => 4,
            ActorFlag::Invisible => 5,
            ActorFlag::Breathing => 35,
            ActorFlag::HasGravity => 46,
        }
    }
}

const FLAG_BITS: usize = 64;

/// Insertion-ordered keyed metadata with a full-snapshot dirty marker
#[derive(Debug, Default)]
pub struct MetadataMap {
    entries: Vec<(MetadataKey, MetadataValue)>,
    index: FxHashMap<MetadataKey, usize>,
    dirty: bool,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has(&self, key: MetadataKey) -> bool {
        self.index.contains_key(&key)
    }

    /// Set an entry, returning the value it replaced
    pub fn set(&mut self, key: MetadataKey, value: MetadataValue) -> Option<MetadataValue> {
        self.dirty = true;
        match self.index.get(&key) {
            Some(&slot) => {
                let previous = std::mem::replace(&mut self.entries[slot].1, value);
                Some(previous)
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: MetadataKey) -> Option<&MetadataValue> {
        self.index.get(&key).map(|&slot| &self.entries[slot].1)
    }

    pub fn remove(&mut self, key: MetadataKey) -> Option<MetadataValue> {
        let slot = self.index.remove(&key)?;
        let (_, removed) = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        self.dirty = true;
        Some(removed)
    }

    /// Full snapshot in insertion order
    pub fn snapshot(&self) -> Vec<(MetadataKey, MetadataValue)> {
        self.entries.clone()
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// The shared boolean flag set
#[derive(Debug)]
pub struct FlagMap {
    bits: BitVec,
    dirty: bool,
}

impl Default for FlagMap {
    fn default() -> Self {
        Self {
            bits: BitVec::from_elem(FLAG_BITS, false),
            dirty: false,
        }
    }
}

impl FlagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, flag: ActorFlag) -> bool {
        self.bits.get(flag.bit()).unwrap_or(false)
    }

    /// Set a flag; only an actual change marks the set for resync
    pub fn set(&mut self, flag: ActorFlag, value: bool) {
        if self.get(flag) != value {
            self.bits.set(flag.bit(), value);
            self.dirty = true;
        }
    }

    /// All flag bits packed into the wire-level integer
    pub fn packed(&self) -> u64 {
        let mut packed = 0u64;
        for (bit, set) in self.bits.iter().enumerate() {
            if set {
                packed |= 1 << bit;
            }
        }
        packed
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_and_returns_previous() {
        let mut map = MetadataMap::new();
        assert!(map
            .set(MetadataKey::Nametag, MetadataValue::String("Steve".into()))
            .is_none());
        let previous = map.set(MetadataKey::Nametag, MetadataValue::String("Alex".into()));
        assert_eq!(previous, Some(MetadataValue::String("Steve".into())));
        assert_eq!(
            map.get(MetadataKey::Nametag),
            Some(&MetadataValue::String("Alex".into()))
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_snapshot_keeps_insertion_order() {
        let mut map = MetadataMap::new();
        map.set(MetadataKey::Scale, MetadataValue::Float(1.0));
        map.set(MetadataKey::Nametag, MetadataValue::String("Zed".into()));
        map.set(MetadataKey::AirSupply, MetadataValue::Short(300));
        let keys: Vec<MetadataKey> = map.snapshot().iter().map(|(key, _)| *key).collect();
        assert_eq!(
            keys,
            vec![MetadataKey::Scale, MetadataKey::Nametag, MetadataKey::AirSupply]
        );
    }

    #[test]
    fn test_flag_bits_pack_into_one_word() {
        let mut flags = FlagMap::new();
        flags.set(ActorFlag::OnFire, true);
        flags.set(ActorFlag::Breathing, true);
        let packed = flags.packed();
        assert_eq!(packed & 1, 1);
        assert_eq!(packed >> 35 & 1, 1);
        assert_eq!(packed >> 1 & 1, 0);
    }

    #[test]
    fn test_flag_dirty_only_on_change() {
        let mut flags = FlagMap::new();
        flags.set(ActorFlag::Sneaking, false);
        assert!(!flags.take_dirty());
        flags.set(ActorFlag::Sneaking, true);
        assert!(flags.take_dirty());
        flags.set(ActorFlag::Sneaking, true);
        assert!(!flags.take_dirty());
    }

    #[test]
    fn test_metadata_dirty_drains() {
        let mut map = MetadataMap::new();
        map.set(MetadataKey::Variant, MetadataValue::Int(2));
        assert!(map.take_dirty());
        assert!(!map.take_dirty());
        map.remove(MetadataKey::Variant);
        assert!(map.take_dirty());
    }
}
