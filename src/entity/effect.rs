//! Status effects
//!
//! An effect is a time-limited modifier applied against the owner's
//! attribute and flag state. Durations count down by a fixed step of
//! two ticks per scheduler pass; expiry fires the removal hook on the
//! same pass that detects it.

use crate::component::{ActorFlag, AttributeKind};
use crate::error::{SimError, SimResult};
use crate::nbt::{CompoundTag, Tag};

use super::Entity;

/// Duration step removed on every scheduler pass
pub const DURATION_STEP: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectType {
    Speed,
    Slowness,
    Regeneration,
    FireResistance,
    Invisibility,
    NightVision,
    Poison,
}

impl EffectType {
    pub fn id(&self) -> u8 {
        match self {
            EffectType::Speed => 1,
            EffectType::Slowness => 2,
            EffectType::Regeneration => 10,
            EffectType::FireResistance => 12,
            EffectType::Invisibility => 14,
            EffectType::NightVision => 16,
            EffectType::Poison => 19,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(EffectType::Speed),
            2 => Some(EffectType::Slowness),
            10 => Some(EffectType::Regeneration),
            12 => Some(EffectType::FireResistance),
            14 => Some(EffectType::Invisibility),
            16 => Some(EffectType::NightVision),
            19 => Some(EffectType::Poison),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectType::Speed => "speed",
            EffectType::Slowness => "slowness",
            EffectType::Regeneration => "regeneration",
            EffectType::FireResistance => "fire_resistance",
            EffectType::Invisibility => "invisibility",
            EffectType::NightVision => "night_vision",
            EffectType::Poison => "poison",
        }
    }

    /// Particle tint as packed RGB
    pub fn color(&self) -> i32 {
        match self {
            EffectType::Speed => 0x33EBFF,
            EffectType::Slowness => 0x5A6C81,
            EffectType::Regeneration => 0xCD5CAB,
            EffectType::FireResistance => 0xE49A3A,
            EffectType::Invisibility => 0x7F8392,
            EffectType::NightVision => 0x1F1FA1,
            EffectType::Poison => 0x4E9331,
        }
    }
}

impl std::fmt::Display for EffectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    effect_type: EffectType,
    duration: i32,
    amplifier: u8,
    show_particles: bool,
}

impl Effect {
    pub fn new(effect_type: EffectType, duration: i32, amplifier: u8) -> Self {
        Self {
            effect_type,
            duration,
            amplifier,
            show_particles: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.show_particles = false;
        self
    }

    pub fn effect_type(&self) -> EffectType {
        self.effect_type
    }

    pub fn duration(&self) -> i32 {
        self.duration
    }

    pub fn amplifier(&self) -> u8 {
        self.amplifier
    }

    pub fn shows_particles(&self) -> bool {
        self.show_particles
    }

    pub fn is_expired(&self) -> bool {
        self.duration <= 0
    }

    /// Advance one scheduler pass
    pub fn decrement(&mut self) {
        self.duration -= DURATION_STEP;
    }

    /// Applied when the effect lands on an owner, and again on reload
    pub fn on_add(&self, entity: &mut Entity) -> SimResult<()> {
        match self.effect_type {
            EffectType::Speed => {
                let boosted = self.scaled_speed(entity, 0.2)?;
                entity
                    .attributes
                    .set_current_value(AttributeKind::MovementSpeed, boosted)?;
            }
            EffectType::Slowness => {
                let slowed = self.scaled_speed(entity, -0.15)?;
                entity
                    .attributes
                    .set_current_value(AttributeKind::MovementSpeed, slowed.max(0.0))?;
            }
            EffectType::Invisibility => {
                entity.flags.set(ActorFlag::Invisible, true);
            }
            EffectType::Regeneration
            | EffectType::FireResistance
            | EffectType::NightVision
            | EffectType::Poison => {}
        }
        Ok(())
    }

    /// Runs every scheduler pass while the effect is active
    pub fn on_tick(&self, entity: &mut Entity, current_tick: u64) -> SimResult<()> {
        match self.effect_type {
            EffectType::Regeneration => {
                let interval = 50u64 >> self.amplifier.min(5);
                if interval <= 1 || current_tick % interval == 0 {
                    entity.attributes.modify(AttributeKind::Health, 1.0)?;
                }
            }
            EffectType::Poison => {
                let interval = 25u64 >> self.amplifier.min(4);
                let health = entity
                    .attributes
                    .current_value(AttributeKind::Health)
                    .unwrap_or(0.0);
                // Poison wears the owner down but never kills
                if health > 1.0 && (interval <= 1 || current_tick % interval == 0) {
                    entity.attributes.modify(AttributeKind::Health, -1.0)?;
                }
            }
            EffectType::Speed
            | EffectType::Slowness
            | EffectType::FireResistance
            | EffectType::Invisibility
            | EffectType::NightVision => {}
        }
        Ok(())
    }

    /// Applied when the effect expires or is explicitly removed
    pub fn on_remove(&self, entity: &mut Entity) -> SimResult<()> {
        match self.effect_type {
            EffectType::Speed | EffectType::Slowness => {
                entity
                    .attributes
                    .reset_to_default(AttributeKind::MovementSpeed)?;
            }
            EffectType::Invisibility => {
                entity.flags.set(ActorFlag::Invisible, false);
            }
            EffectType::Regeneration
            | EffectType::FireResistance
            | EffectType::NightVision
            | EffectType::Poison => {}
        }
        Ok(())
    }

    fn scaled_speed(&self, entity: &Entity, per_level: f32) -> SimResult<f32> {
        let base = entity
            .attributes
            .get(AttributeKind::MovementSpeed)
            .map(|attribute| attribute.default_value())
            .ok_or(SimError::ComponentMissing {
                owner: entity.identifier().to_string(),
                identifier: AttributeKind::MovementSpeed.as_str().to_string(),
            })?;
        Ok(base * (1.0 + per_level * (self.amplifier as f32 + 1.0)))
    }

    pub fn to_nbt(&self) -> CompoundTag {
        let mut entry = CompoundTag::new();
        entry.set_byte("Id", self.effect_type.id() as i8);
        entry.set_int("Duration", self.duration);
        entry.set_byte("Amplifier", self.amplifier as i8);
        entry.set_byte("ShowParticles", self.show_particles as i8);
        entry
    }

    pub fn from_nbt(entry: &CompoundTag) -> SimResult<Self> {
        let id = entry.require_byte("Id")? as u8;
        let effect_type = EffectType::from_id(id).ok_or_else(|| SimError::TagDecode {
            reason: format!("unknown effect id {}", id),
        })?;
        Ok(Self {
            effect_type,
            duration: entry.require_int("Duration")?,
            amplifier: entry.require_byte("Amplifier")? as u8,
            show_particles: entry.get_byte("ShowParticles").unwrap_or(1) != 0,
        })
    }

    /// Persisted list entry order is the effect id
    pub fn list_to_nbt(effects: impl Iterator<Item = Self>) -> Tag {
        Tag::List(effects.map(|effect| Tag::Compound(effect.to_nbt())).collect())
    }
}
