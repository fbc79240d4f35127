//! Runtime holders.
//!
//! A holder wraps one item type inside a fit: it owns a mutable
//! attribute-value cache, a current activation state, and whatever
//! pairing/projection a holder of its kind can carry. Holders are
//! created detached — no id, no fit — and only gain a [`HolderId`] when
//! [`crate::fit::Fit::attach`] assigns one.

use std::collections::HashMap;

use fit_data::{AttributeId, HolderState, Location, TypeId};

use crate::ids::HolderId;

/// The role a holder plays inside a fit. Distinct from an item type's
/// static `category_id`/`slots` — this is the engine's own runtime
/// classification, used by the affection resolver's container lookups
/// and by the attribute calculator's stacking-penalty exemption rule:
/// ship/charge/skill/implant/subsystem sources are exempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HolderKind {
    Ship,
    Character,
    Module,
    Drone,
    Implant,
    Booster,
    Skill,
    Charge,
    Subsystem,
}

impl HolderKind {
    /// Which container (if any) this kind is a member of for `all`/
    /// `group`/`skill` filter resolution. Ship and character are
    /// containers themselves, not members of one.
    pub fn member_of(self) -> Option<Location> {
        match self {
            HolderKind::Module | HolderKind::Drone | HolderKind::Charge | HolderKind::Subsystem => {
                Some(Location::Ship)
            }
            HolderKind::Implant | HolderKind::Booster | HolderKind::Skill => {
                Some(Location::Character)
            }
            HolderKind::Ship | HolderKind::Character => None,
        }
    }

    /// The location a holder of this kind itself resolves to when it
    /// *is* the fit slot a modifier names (`character`/`ship`).
    pub fn fit_slot(self) -> Option<Location> {
        match self {
            HolderKind::Ship => Some(Location::Ship),
            HolderKind::Character => Some(Location::Character),
            _ => None,
        }
    }

    /// Stacking-penalty exemption.
    pub fn exempt_from_stacking_penalty(self) -> bool {
        matches!(
            self,
            HolderKind::Ship
                | HolderKind::Charge
                | HolderKind::Skill
                | HolderKind::Implant
                | HolderKind::Subsystem
        )
    }
}

/// One runtime holder. See module docs for lifecycle.
#[derive(Debug, Clone)]
pub struct Holder {
    id: Option<HolderId>,
    pub kind: HolderKind,
    pub item_id: TypeId,
    state: HolderState,
    /// Set only on a [`HolderKind::Skill`] holder; backs the
    /// skill-level read-contract shortcut that every read checks first.
    pub skill_level: Option<u32>,
    /// The holder this one is paired with via the module↔charge "other"
    /// pseudo-location.
    pub container_link: Option<HolderId>,
    /// The holder this one is currently projected onto
    /// (`context = projected`), settable only through
    /// `Fit::set_projection`.
    pub projected_target: Option<HolderId>,
    cache: HashMap<AttributeId, f64>,
    overrides: HashMap<AttributeId, f64>,
}

impl Holder {
    pub fn new(kind: HolderKind, item_id: TypeId) -> Self {
        Self {
            id: None,
            kind,
            item_id,
            state: HolderState::Offline,
            skill_level: None,
            container_link: None,
            projected_target: None,
            cache: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    pub fn skill(item_id: TypeId, level: u32) -> Self {
        let mut holder = Self::new(HolderKind::Skill, item_id);
        holder.skill_level = Some(level);
        holder
    }

    pub fn id(&self) -> Option<HolderId> {
        self.id
    }

    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }

    pub fn state(&self) -> HolderState {
        self.state
    }

    pub(crate) fn set_id(&mut self, id: HolderId) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
        self.cache.clear();
    }

    pub(crate) fn set_state_raw(&mut self, state: HolderState) {
        self.state = state;
    }

    /// An override takes precedence over a computed value and is never
    /// evicted by the invalidator on its own — only by an explicit
    /// `delete_override`.
    pub fn set_override(&mut self, attr: AttributeId, value: f64) {
        self.overrides.insert(attr, value);
        self.cache.insert(attr, value);
    }

    pub fn delete_override(&mut self, attr: AttributeId) {
        self.overrides.remove(&attr);
        self.cache.remove(&attr);
    }

    pub fn has_override(&self, attr: AttributeId) -> bool {
        self.overrides.contains_key(&attr)
    }

    pub(crate) fn cached(&self, attr: AttributeId) -> Option<f64> {
        self.cache.get(&attr).copied()
    }

    pub(crate) fn store_cached(&mut self, attr: AttributeId, value: f64) {
        self.cache.insert(attr, value);
    }

    pub(crate) fn evict_cached(&mut self, attr: AttributeId) -> bool {
        if self.overrides.contains_key(&attr) {
            return false;
        }
        self.cache.remove(&attr).is_some()
    }

    pub(crate) fn clear_cache(&mut self) {
        self.cache.retain(|attr, _| self.overrides.contains_key(attr));
    }

    pub fn known_attributes(&self) -> impl Iterator<Item = AttributeId> + '_ {
        self.cache.keys().copied()
    }
}
