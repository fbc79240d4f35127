//! Effect categories and effects.

use crate::modifier::{HolderState, ModifierRecord};
use serde::{Deserialize, Serialize};

/// Authoritative effect category codes and the highest activation state
/// each one allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EffectCategory {
    Passive = 0,
    Active = 1,
    Target = 2,
    Area = 3,
    Online = 4,
    Overload = 5,
    Dungeon = 6,
    System = 7,
}

impl EffectCategory {
    /// Highest holder state this effect category allows.
    pub fn highest_allowed_state(self) -> HolderState {
        match self {
            EffectCategory::Passive => HolderState::Offline,
            EffectCategory::Active => HolderState::Active,
            EffectCategory::Target => HolderState::Active,
            EffectCategory::Area => HolderState::Offline,
            EffectCategory::Online => HolderState::Online,
            EffectCategory::Overload => HolderState::Overload,
            EffectCategory::Dungeon => HolderState::Offline,
            EffectCategory::System => HolderState::Offline,
        }
    }
}

/// A static effect: a category plus an ordered list of compiled modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub category: EffectCategory,
    pub modifiers: Vec<ModifierRecord>,
}

impl Effect {
    pub fn new(category: EffectCategory) -> Self {
        Self {
            category,
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifier(mut self, modifier: ModifierRecord) -> Self {
        self.modifiers.push(modifier);
        self
    }
}
