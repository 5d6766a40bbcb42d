//! Keyed compound of child tags with deterministic ordering

use std::collections::btree_map::{Entry, Iter};
use std::collections::BTreeMap;

use super::tag::{Tag, TagType};
use crate::error::{SimError, SimResult};

/// A compound node: string keys mapped to child tags, iterated in sorted
/// key order so encodings and snapshots are reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundTag {
    children: BTreeMap<String, Tag>,
}

impl CompoundTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.children.contains_key(key)
    }

    /// Insert a child, returning the previous tag under the key if any
    pub fn insert(&mut self, key: impl Into<String>, tag: Tag) -> Option<Tag> {
        self.children.insert(key.into(), tag)
    }

    /// Insert only when the key is absent; returns whether the insert happened
    pub fn insert_if_absent(&mut self, key: impl Into<String>, tag: Tag) -> bool {
        match self.children.entry(key.into()) {
            Entry::Vacant(entry) => {
                entry.insert(tag);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.children.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Tag> {
        self.children.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        self.children.remove(key)
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.children.keys()
    }

    pub fn iter(&self) -> Iter<'_, String, Tag> {
        self.children.iter()
    }

    // Optional typed reads. Absent keys and mismatched types both yield None.

    pub fn get_byte(&self, key: &str) -> Option<i8> {
        self.get(key).and_then(Tag::as_byte)
    }

    pub fn get_short(&self, key: &str) -> Option<i16> {
        self.get(key).and_then(Tag::as_short)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Tag::as_int)
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Tag::as_long)
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(Tag::as_float)
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Tag::as_double)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Tag::as_str)
    }

    pub fn get_list(&self, key: &str) -> Option<&[Tag]> {
        self.get(key).and_then(Tag::as_list)
    }

    pub fn get_compound(&self, key: &str) -> Option<&CompoundTag> {
        self.get(key).and_then(Tag::as_compound)
    }

    pub fn get_compound_mut(&mut self, key: &str) -> Option<&mut CompoundTag> {
        self.get_mut(key).and_then(Tag::as_compound_mut)
    }

    // Required typed reads for definition parsing. A missing key or a
    // mismatched type is a configuration error, never silently coerced.

    pub fn require_byte(&self, key: &str) -> SimResult<i8> {
        self.require(key, TagType::Byte)?.as_byte().ok_or_else(|| {
            unreachable_mismatch(key)
        })
    }

    pub fn require_short(&self, key: &str) -> SimResult<i16> {
        self.require(key, TagType::Short)?
            .as_short()
            .ok_or_else(|| unreachable_mismatch(key))
    }

    pub fn require_int(&self, key: &str) -> SimResult<i32> {
        self.require(key, TagType::Int)?
            .as_int()
            .ok_or_else(|| unreachable_mismatch(key))
    }

    pub fn require_long(&self, key: &str) -> SimResult<i64> {
        self.require(key, TagType::Long)?
            .as_long()
            .ok_or_else(|| unreachable_mismatch(key))
    }

    pub fn require_float(&self, key: &str) -> SimResult<f32> {
        self.require(key, TagType::Float)?
            .as_float()
            .ok_or_else(|| unreachable_mismatch(key))
    }

    pub fn require_string(&self, key: &str) -> SimResult<&str> {
        match self.require(key, TagType::String)? {
            Tag::String(v) => Ok(v),
            _ => Err(unreachable_mismatch(key)),
        }
    }

    pub fn require_list(&self, key: &str) -> SimResult<&[Tag]> {
        match self.require(key, TagType::List)? {
            Tag::List(v) => Ok(v),
            _ => Err(unreachable_mismatch(key)),
        }
    }

    pub fn require_compound(&self, key: &str) -> SimResult<&CompoundTag> {
        match self.require(key, TagType::Compound)? {
            Tag::Compound(v) => Ok(v),
            _ => Err(unreachable_mismatch(key)),
        }
    }

    fn require(&self, key: &str, expected: TagType) -> SimResult<&Tag> {
        match self.get(key) {
            Some(tag) if tag.tag_type() == expected => Ok(tag),
            Some(tag) => Err(SimError::WrongTagType {
                key: key.to_string(),
                expected: expected.name(),
                found: tag.tag_type().name(),
            }),
            None => Err(SimError::WrongTagType {
                key: key.to_string(),
                expected: expected.name(),
                found: "missing",
            }),
        }
    }

    // Typed writes

    pub fn set_byte(&mut self, key: impl Into<String>, value: i8) {
        self.insert(key, Tag::Byte(value));
    }

    pub fn set_short(&mut self, key: impl Into<String>, value: i16) {
        self.insert(key, Tag::Short(value));
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        self.insert(key, Tag::Int(value));
    }

    pub fn set_long(&mut self, key: impl Into<String>, value: i64) {
        self.insert(key, Tag::Long(value));
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.insert(key, Tag::Float(value));
    }

    pub fn set_double(&mut self, key: impl Into<String>, value: f64) {
        self.insert(key, Tag::Double(value));
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, Tag::String(value.into()));
    }

    pub fn set_list(&mut self, key: impl Into<String>, value: Vec<Tag>) {
        self.insert(key, Tag::List(value));
    }

    pub fn set_compound(&mut self, key: impl Into<String>, value: CompoundTag) {
        self.insert(key, Tag::Compound(value));
    }
}

fn unreachable_mismatch(key: &str) -> SimError {
    SimError::Internal {
        message: format!("tag type check out of sync for key '{}'", key),
    }
}

impl FromIterator<(String, Tag)> for CompoundTag {
    fn from_iter<I: IntoIterator<Item = (String, Tag)>>(iter: I) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CompoundTag {
    type Item = (String, Tag);
    type IntoIter = std::collections::btree_map::IntoIter<String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.into_iter()
    }
}
