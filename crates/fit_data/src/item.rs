//! Item types.

use crate::effect::{Effect, EffectCategory};
use crate::ids::{AttributeId, CategoryId, GroupId, SkillId, TypeId};
use crate::modifier::HolderState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fit slot kinds an item type can occupy. Used only by restriction
/// validators and the affection resolver's container lookups; this
/// engine does not itself enforce slot-count legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    HighSlot,
    MidSlot,
    LowSlot,
    RigSlot,
    SubsystemSlot,
    DroneBay,
    BoosterSlot,
    ImplantSlot,
}

/// Static, shared, immutable-after-load description of one numeric item
/// id. Identity is by `id` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemType {
    pub id: TypeId,
    pub group_id: GroupId,
    pub category_id: CategoryId,
    pub attributes: HashMap<AttributeId, f64>,
    pub effects: Vec<Effect>,
    /// Skills (and minimum levels) required to use this item type.
    #[serde(default)]
    pub required_skills: HashMap<SkillId, u8>,
    #[serde(default)]
    pub slots: Vec<SlotKind>,
    /// Whether this item type can be the source of a `projected` modifier
    /// onto another holder.
    #[serde(default)]
    pub targeted: bool,
}

impl ItemType {
    pub fn new(id: TypeId, group_id: GroupId, category_id: CategoryId) -> Self {
        Self {
            id,
            group_id,
            category_id,
            attributes: HashMap::new(),
            effects: Vec::new(),
            required_skills: HashMap::new(),
            slots: Vec::new(),
            targeted: false,
        }
    }

    pub fn with_attribute(mut self, id: AttributeId, value: f64) -> Self {
        self.attributes.insert(id, value);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn requiring_skill(mut self, skill: SkillId, level: u8) -> Self {
        self.required_skills.insert(skill, level);
        self
    }

    pub fn targeted(mut self, targeted: bool) -> Self {
        self.targeted = targeted;
        self
    }

    /// Highest holder state this item type's effects allow: a holder's
    /// requested state is clamped to this before taking effect.
    pub fn highest_allowed_state(&self) -> HolderState {
        self.effects
            .iter()
            .map(|e| e.category.highest_allowed_state())
            .max()
            .unwrap_or(HolderState::Offline)
    }

    /// All effect categories present on this item type, in effect order.
    pub fn effect_categories(&self) -> impl Iterator<Item = EffectCategory> + '_ {
        self.effects.iter().map(|e| e.category)
    }
}
