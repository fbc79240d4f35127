//! The fit aggregate.
//!
//! Owns every holder attached to it plus the one [`LinkTracker`] they
//! share. All structural mutation — attach, detach, state change,
//! charge swap, projection change — funnels through here so that edge
//! reconciliation and cache invalidation happen in exactly one place.
//!
//! Reconciliation takes the simplest correct shape for a graph this
//! small: after any structural change, every attached holder's
//! currently-live modifiers are resolved fresh against the whole fit
//! and diffed against the previously-installed edge set. This
//! sidesteps the asymmetry a narrower per-holder register/unregister
//! scheme would have — e.g. a modifier anchored at the character that
//! targets the ship, registered before the ship existed, would otherwise
//! never get a second chance to resolve once the ship attaches.

use std::collections::{HashMap, HashSet};

use fit_data::{HolderState, ModifierRecord, StaticDataCache};

use crate::affection;
use crate::error::FitError;
use crate::holder::{Holder, HolderKind};
use crate::ids::HolderId;
use crate::invalidate;
use crate::link::LinkTracker;
use crate::state::{self, ModifierSlot};
use fit_services::EngineSettings;
use fit_data::Location;

pub struct Fit {
    next_id: u64,
    holders: HashMap<HolderId, Holder>,
    ship_id: Option<HolderId>,
    character_id: Option<HolderId>,
    link: LinkTracker,
    settings: EngineSettings,
    #[cfg(feature = "metrics")]
    metrics: fit_metrics::Counter,
}

impl Fit {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            next_id: 1,
            holders: HashMap::new(),
            ship_id: None,
            character_id: None,
            link: LinkTracker::new(),
            settings,
            #[cfg(feature = "metrics")]
            metrics: fit_metrics::Counter::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Named counters this fit has accumulated; present only with the
    /// `metrics` feature enabled.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> &fit_metrics::Counter {
        &self.metrics
    }

    /// Bumps a named counter by one. A no-op call with the `metrics`
    /// feature disabled, so call sites never need their own `#[cfg]`.
    pub(crate) fn bump_metric(&mut self, name: &str) {
        #[cfg(feature = "metrics")]
        {
            self.metrics.increment(name, 1);
        }
        #[cfg(not(feature = "metrics"))]
        {
            let _ = name;
        }
    }

    pub fn holder(&self, id: HolderId) -> Option<&Holder> {
        self.holders.get(&id)
    }

    pub fn holder_mut(&mut self, id: HolderId) -> Option<&mut Holder> {
        self.holders.get_mut(&id)
    }

    pub fn ship_id(&self) -> Option<HolderId> {
        self.ship_id
    }

    pub fn character_id(&self) -> Option<HolderId> {
        self.character_id
    }

    pub fn link_tracker(&self) -> &LinkTracker {
        &self.link
    }

    pub fn link_tracker_mut(&mut self) -> &mut LinkTracker {
        &mut self.link
    }

    /// Every currently-attached holder belonging to `location`'s
    /// container (ship or character); empty for any other location.
    pub fn members_of_container(&self, location: Location) -> Vec<HolderId> {
        self.holders
            .values()
            .filter(|h| h.kind.member_of() == Some(location))
            .filter_map(|h| h.id())
            .collect()
    }

    /// Attach a freshly-built, detached holder to this fit. Every holder
    /// belongs to at most one fit.
    ///
    /// Rejects a `self`+filter modifier up front with a bad-container
    /// error rather than waiting for the affection resolver to discover
    /// it lazily.
    pub fn attach(&mut self, cache: &dyn StaticDataCache, mut holder: Holder) -> Result<HolderId, FitError> {
        if holder.is_attached() {
            return Err(FitError::AlreadyAttached(holder.id().unwrap()));
        }
        if let Ok(item) = cache.get_type(holder.item_id) {
            for effect in &item.effects {
                for modifier in &effect.modifiers {
                    if modifier.location == Location::Slf && modifier.filter_targets_container() {
                        return Err(FitError::BadContainer);
                    }
                }
            }
        }

        // Ship and character are single-occupancy slots; attaching a new
        // one replaces whatever was there.
        match holder.kind {
            HolderKind::Ship => {
                if let Some(old) = self.ship_id {
                    self.detach(cache, old)?;
                }
            }
            HolderKind::Character => {
                if let Some(old) = self.character_id {
                    self.detach(cache, old)?;
                }
            }
            _ => {}
        }

        let id = HolderId::new(self.next_id);
        self.next_id += 1;
        holder.set_id(id);

        match holder.kind {
            HolderKind::Ship => self.ship_id = Some(id),
            HolderKind::Character => self.character_id = Some(id),
            _ => {}
        }

        self.holders.insert(id, holder);
        self.reconcile_edges(cache);
        Ok(id)
    }

    /// Detach a holder by removal or fit destruction. Also clears any
    /// charge/container pairing pointing at it so the "other" location
    /// never resolves to a stale id.
    pub fn detach(&mut self, cache: &dyn StaticDataCache, id: HolderId) -> Result<(), FitError> {
        if !self.holders.contains_key(&id) {
            return Err(FitError::NotInFit(id));
        }
        if self.ship_id == Some(id) {
            self.ship_id = None;
        }
        if self.character_id == Some(id) {
            self.character_id = None;
        }
        for other in self.holders.values_mut() {
            if other.container_link == Some(id) {
                other.container_link = None;
            }
            if other.projected_target == Some(id) {
                other.projected_target = None;
            }
        }
        if let Some(mut holder) = self.holders.remove(&id) {
            holder.clear_id();
        }
        self.reconcile_edges(cache);
        Ok(())
    }

    /// Request a new activation state for `id`. A no-op if the state is
    /// unchanged; rejects states above the item's allowed maximum.
    pub fn set_state(
        &mut self,
        cache: &dyn StaticDataCache,
        id: HolderId,
        new_state: HolderState,
    ) -> Result<(), FitError> {
        let holder = self.holders.get(&id).ok_or(FitError::NotInFit(id))?;
        if holder.state() == new_state {
            return Ok(());
        }

        let highest = match cache.get_type(holder.item_id) {
            Ok(item) => item.highest_allowed_state(),
            Err(_) => {
                tracing::error!(
                    exception_type = ?"MetaError",
                    item_id = holder.item_id.raw(),
                    child_name = "attributeCalculator",
                    "item type not found while checking allowed state"
                );
                HolderState::Offline
            }
        };
        if new_state > highest {
            return Err(FitError::StateNotAllowed { holder: id });
        }

        let holder = self.holders.get_mut(&id).expect("checked above");
        holder.set_state_raw(new_state);
        holder.clear_cache();
        self.reconcile_edges(cache);
        Ok(())
    }

    /// Bind/unbind a holder as the `projected` context's target for
    /// `id`: a single optional target pointer per holder, settable only
    /// if the holder's item is `targeted`.
    pub fn set_projection(
        &mut self,
        cache: &dyn StaticDataCache,
        id: HolderId,
        target: Option<HolderId>,
    ) -> Result<(), FitError> {
        let holder = self.holders.get(&id).ok_or(FitError::NotInFit(id))?;
        if let Some(target_id) = target {
            let targeted = cache
                .get_type(holder.item_id)
                .map(|item| item.targeted)
                .unwrap_or(false);
            if !targeted {
                return Err(FitError::NotProjectable(id));
            }
            if !self.holders.contains_key(&target_id) {
                return Err(FitError::NotInFit(target_id));
            }
        }
        let holder = self.holders.get_mut(&id).expect("checked above");
        holder.projected_target = target;
        holder.clear_cache();
        self.reconcile_edges(cache);
        Ok(())
    }

    pub fn projection_target(&self, id: HolderId) -> Result<HolderId, FitError> {
        let holder = self.holder(id).ok_or(FitError::NotInFit(id))?;
        holder.projected_target.ok_or(FitError::NoProjectionTarget(id))
    }

    /// Swap the charge loaded into `module_id`: unregisters the old
    /// charge, attaches the new one, and rewires the bidirectional
    /// "other" pairing on both endpoints.
    pub fn set_charge(
        &mut self,
        cache: &dyn StaticDataCache,
        module_id: HolderId,
        new_charge: Option<Holder>,
    ) -> Result<Option<HolderId>, FitError> {
        let module = self.holders.get(&module_id).ok_or(FitError::NotInFit(module_id))?;
        let old_charge = module.container_link;
        if let Some(old_id) = old_charge {
            self.detach(cache, old_id)?;
        }

        let new_id = match new_charge {
            Some(mut charge) => {
                if charge.is_attached() {
                    return Err(FitError::AlreadyAttached(charge.id().unwrap()));
                }
                charge.container_link = Some(module_id);
                let id = self.attach(cache, charge)?;
                if let Some(module) = self.holders.get_mut(&module_id) {
                    module.container_link = Some(id);
                }
                Some(id)
            }
            None => {
                if let Some(module) = self.holders.get_mut(&module_id) {
                    module.container_link = None;
                }
                None
            }
        };

        self.reconcile_edges(cache);
        Ok(new_id)
    }

    pub fn set_override(&mut self, id: HolderId, attr: fit_data::AttributeId, value: f64) -> Result<(), FitError> {
        let holder = self.holders.get_mut(&id).ok_or(FitError::NotInFit(id))?;
        holder.set_override(attr, value);
        invalidate::evict_dependents(self, id, attr);
        Ok(())
    }

    pub fn delete_override(&mut self, id: HolderId, attr: fit_data::AttributeId) -> Result<(), FitError> {
        let holder = self.holders.get_mut(&id).ok_or(FitError::NotInFit(id))?;
        holder.delete_override(attr);
        invalidate::evict(self, id, attr);
        Ok(())
    }

    /// Read `holder[attr]` through the attribute calculator. Thin
    /// wrapper kept for ergonomics; [`crate::attribute::read`] is the
    /// canonical entry point.
    pub fn attribute(
        &mut self,
        cache: &dyn StaticDataCache,
        holder: HolderId,
        attr: fit_data::AttributeId,
    ) -> Result<f64, FitError> {
        crate::attribute::read(self, cache, holder, attr)
    }

    /// Recompute the full set of live modifier edges from scratch and
    /// diff it against what's currently installed (see module docs for
    /// why full recompute rather than narrow incremental register/
    /// unregister). Every added or removed edge evicts its target
    /// attribute's cached value.
    fn reconcile_edges(&mut self, cache: &dyn StaticDataCache) {
        let desired = compute_desired_edges(self, cache);
        let desired_set: HashSet<(HolderId, ModifierSlot, HolderId, ModifierRecord)> =
            desired.iter().copied().collect();

        let existing: Vec<(crate::link::EdgeId, HolderId, ModifierSlot, HolderId, ModifierRecord)> = self
            .link
            .all_edges()
            .map(|(edge_id, edge)| (edge_id, edge.source, edge.slot, edge.target, edge.modifier))
            .collect();

        let mut to_remove = Vec::new();
        for (edge_id, source, slot, target, modifier) in &existing {
            if !desired_set.contains(&(*source, *slot, *target, *modifier)) {
                to_remove.push((*edge_id, *target, modifier.target_attribute_id));
            }
        }

        let existing_set: HashSet<(HolderId, ModifierSlot, HolderId, ModifierRecord)> = existing
            .iter()
            .map(|(_, source, slot, target, modifier)| (*source, *slot, *target, *modifier))
            .collect();

        for (edge_id, target, target_attr) in to_remove {
            self.link.remove_edge(edge_id);
            self.bump_metric("link.edge_removed");
            invalidate::evict(self, target, target_attr);
        }

        for (source, slot, target, modifier) in desired {
            if !existing_set.contains(&(source, slot, target, modifier)) {
                self.link.insert_edge(source, target, slot, modifier);
                self.bump_metric("link.edge_added");
                invalidate::evict(self, target, modifier.target_attribute_id);
            }
        }
    }
}

fn compute_desired_edges(
    fit: &Fit,
    cache: &dyn StaticDataCache,
) -> Vec<(HolderId, ModifierSlot, HolderId, ModifierRecord)> {
    let mut desired = Vec::new();
    let mut ids: Vec<HolderId> = fit.holders.keys().copied().collect();
    ids.sort();

    for source_id in ids {
        let Some(holder) = fit.holders.get(&source_id) else { continue };
        let Ok(item) = cache.get_type(holder.item_id) else { continue };
        for (slot, modifier) in state::live_modifiers(item, holder) {
            match affection::resolve(fit, cache, source_id, modifier) {
                Ok(targets) => {
                    for target_id in targets {
                        desired.push((source_id, slot, target_id, *modifier));
                    }
                }
                Err(_) => {
                    // Attach-time validation already rejects the one
                    // hard-failure case (self+filter); anything else is
                    // unreachable here, but degrade rather than panic.
                }
            }
        }
    }
    desired
}

#[cfg(test)]
mod tests {
    use super::*;
    use fit_data::{
        AttributeMeta, CategoryId, Context, Effect, EffectCategory, FilterType, GroupId, ItemType,
        Operator, TypeId,
    };

    fn cache_with(items: Vec<ItemType>, attrs: Vec<AttributeMeta>) -> fit_data::InMemoryStaticDataCache {
        let mut cache = fit_data::InMemoryStaticDataCache::new();
        for item in items {
            cache.insert_type(item);
        }
        for attr in attrs {
            cache.insert_attribute(attr);
        }
        cache
    }

    #[test]
    fn detached_holder_reads_its_own_base_value() {
        let cache = cache_with(
            vec![ItemType::new(TypeId::new(1), GroupId::new(1), CategoryId::new(1))
                .with_attribute(fit_data::AttributeId::new(56), 50.0)],
            vec![],
        );
        let holder = Holder::new(HolderKind::Module, TypeId::new(1));
        let mut fit = Fit::new(EngineSettings::default());
        let skill_level_attr = fit.settings().skill_level_attribute_id;
        let value = crate::attribute::read_detached(&holder, &cache, skill_level_attr, fit_data::AttributeId::new(56));
        assert_eq!(value, Ok(50.0));
        drop(fit.attribute(&cache, HolderId::new(999), fit_data::AttributeId::new(56)));
    }

    #[test]
    fn attaching_self_plus_filter_modifier_is_rejected() {
        let bad_modifier = ModifierRecord {
            state: HolderState::Offline,
            context: Context::Local,
            location: Location::Slf,
            filter_type: FilterType::All,
            filter_value: None,
            operator: Operator::PostPercent,
            source_attribute_id: fit_data::AttributeId::new(1),
            target_attribute_id: fit_data::AttributeId::new(2),
        };
        let item = ItemType::new(TypeId::new(1), GroupId::new(1), CategoryId::new(1))
            .with_effect(Effect::new(EffectCategory::Passive).with_modifier(bad_modifier));
        let cache = cache_with(vec![item], vec![]);
        let mut fit = Fit::new(EngineSettings::default());
        let holder = Holder::new(HolderKind::Module, TypeId::new(1));
        let result = fit.attach(&cache, holder);
        assert_eq!(result, Err(FitError::BadContainer));
    }
}
