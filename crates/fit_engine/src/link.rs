//! The link tracker: the modifier-edge registry between holders.
//!
//! A forward index keyed by target, an inverse index keyed by source,
//! both plain `HashMap`s — fits are small, so there's no need for a
//! paged arena. Edges are stored in one `HashMap<EdgeId, Edge>`; the
//! index maps hold only ids, so removing an edge never shifts anyone
//! else's.

use std::collections::HashMap;

use fit_data::{AttributeId, ModifierRecord};

use crate::ids::HolderId;
use crate::state::ModifierSlot;

pub type EdgeId = u64;

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub source: HolderId,
    pub target: HolderId,
    /// Identifies which modifier on the source item this edge came from,
    /// so two structurally-identical modifier records on the same item
    /// don't collapse into one edge identity during reconciliation.
    pub slot: ModifierSlot,
    pub modifier: ModifierRecord,
}

/// One `(sourceHolder, modifier)` affector pair, as handed to the
/// attribute calculator by [`LinkTracker::affectors`].
#[derive(Debug, Clone, Copy)]
pub struct Affector {
    pub source: HolderId,
    pub modifier: ModifierRecord,
}

#[derive(Debug, Default)]
pub struct LinkTracker {
    next_id: EdgeId,
    edges: HashMap<EdgeId, Edge>,
    by_target_attr: HashMap<(HolderId, AttributeId), Vec<EdgeId>>,
    by_source_attr: HashMap<(HolderId, AttributeId), Vec<EdgeId>>,
    by_source_holder: HashMap<HolderId, Vec<EdgeId>>,
    by_target_holder: HashMap<HolderId, Vec<EdgeId>>,
    /// `(holder, cappingAttr) -> [(holder, cappedAttr)]`.
    cap_deps: HashMap<(HolderId, AttributeId), Vec<(HolderId, AttributeId)>>,
}

impl LinkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_edge(
        &mut self,
        source: HolderId,
        target: HolderId,
        slot: ModifierSlot,
        modifier: ModifierRecord,
    ) -> EdgeId {
        let id = self.next_id;
        self.next_id += 1;
        let edge = Edge { source, target, slot, modifier };
        self.by_target_attr
            .entry((target, modifier.target_attribute_id))
            .or_default()
            .push(id);
        self.by_source_attr
            .entry((source, modifier.source_attribute_id))
            .or_default()
            .push(id);
        self.by_source_holder.entry(source).or_default().push(id);
        self.by_target_holder.entry(target).or_default().push(id);
        self.edges.insert(id, edge);
        id
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;
        remove_from_index(&mut self.by_target_attr, (edge.target, edge.modifier.target_attribute_id), id);
        remove_from_index(&mut self.by_source_attr, (edge.source, edge.modifier.source_attribute_id), id);
        remove_from_index(&mut self.by_source_holder, edge.source, id);
        remove_from_index(&mut self.by_target_holder, edge.target, id);
        Some(edge)
    }

    /// All edges currently present, as `(source, effect-free modifier,
    /// target)` triples — used by [`crate::fit::Fit`] to diff a freshly
    /// resolved edge set against the one currently installed.
    pub fn all_edges(&self) -> impl Iterator<Item = (EdgeId, Edge)> + '_ {
        self.edges.iter().map(|(id, e)| (*id, *e))
    }

    pub fn affectors(&self, target: HolderId, attr: AttributeId) -> Vec<Affector> {
        self.by_target_attr
            .get(&(target, attr))
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id))
            .map(|e| Affector { source: e.source, modifier: e.modifier })
            .collect()
    }

    /// Every edge ever removed when `holder` leaves the fit, be it as
    /// source or target.
    pub fn remove_holder(&mut self, holder: HolderId) -> Vec<Edge> {
        let mut ids: Vec<EdgeId> = self
            .by_source_holder
            .get(&holder)
            .cloned()
            .unwrap_or_default();
        ids.extend(self.by_target_holder.get(&holder).cloned().unwrap_or_default());
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().filter_map(|id| self.remove_edge(id)).collect()
    }

    pub fn record_cap(&mut self, holder: HolderId, capped_attr: AttributeId, capping_attr: AttributeId) {
        let deps = self.cap_deps.entry((holder, capping_attr)).or_default();
        if !deps.contains(&(holder, capped_attr)) {
            deps.push((holder, capped_attr));
        }
    }

    pub fn cap_dependents(&self, holder: HolderId, attr: AttributeId) -> Vec<(HolderId, AttributeId)> {
        self.cap_deps.get(&(holder, attr)).cloned().unwrap_or_default()
    }

    /// Affector dependents of `(holder, attr)`: every `(target, attr)`
    /// pair that currently reads `holder`'s `attr` as a modifier source.
    pub fn affector_dependents(&self, holder: HolderId, attr: AttributeId) -> Vec<(HolderId, AttributeId)> {
        self.by_source_attr
            .get(&(holder, attr))
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id))
            .map(|e| (e.target, e.modifier.target_attribute_id))
            .collect()
    }
}

fn remove_from_index<K: std::hash::Hash + Eq>(index: &mut HashMap<K, Vec<EdgeId>>, key: K, id: EdgeId) {
    if let Some(ids) = index.get_mut(&key) {
        ids.retain(|existing| *existing != id);
        if ids.is_empty() {
            index.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fit_data::{Context, FilterType, HolderState, Location, Operator};

    fn modifier(source_attr: u32, target_attr: u32) -> ModifierRecord {
        ModifierRecord {
            state: HolderState::Offline,
            context: Context::Local,
            location: Location::Ship,
            filter_type: FilterType::All,
            filter_value: None,
            operator: Operator::PostPercent,
            source_attribute_id: AttributeId::new(source_attr),
            target_attribute_id: AttributeId::new(target_attr),
        }
    }

    fn slot(n: usize) -> ModifierSlot {
        ModifierSlot { effect_index: 0, modifier_index: n }
    }

    #[test]
    fn insert_then_query_affectors() {
        let mut tracker = LinkTracker::new();
        let a = HolderId::new(1);
        let b = HolderId::new(2);
        tracker.insert_edge(a, b, slot(0), modifier(10, 20));
        let affectors = tracker.affectors(b, AttributeId::new(20));
        assert_eq!(affectors.len(), 1);
        assert_eq!(affectors[0].source, a);
    }

    #[test]
    fn removing_holder_drops_edges_both_directions() {
        let mut tracker = LinkTracker::new();
        let a = HolderId::new(1);
        let b = HolderId::new(2);
        let c = HolderId::new(3);
        tracker.insert_edge(a, b, slot(0), modifier(10, 20));
        tracker.insert_edge(b, c, slot(0), modifier(20, 30));
        let removed = tracker.remove_holder(b);
        assert_eq!(removed.len(), 2);
        assert!(tracker.affectors(b, AttributeId::new(20)).is_empty());
        assert!(tracker.affectors(c, AttributeId::new(30)).is_empty());
    }

    #[test]
    fn cap_dependents_round_trip() {
        let mut tracker = LinkTracker::new();
        let h = HolderId::new(1);
        tracker.record_cap(h, AttributeId::new(1), AttributeId::new(2));
        assert_eq!(
            tracker.cap_dependents(h, AttributeId::new(2)),
            vec![(h, AttributeId::new(1))]
        );
    }
}
