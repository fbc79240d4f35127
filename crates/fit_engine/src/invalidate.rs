//! The dependency invalidator.
//!
//! Two dependency classes, both tracked by the link tracker: affector
//! dependency (a cached value read another holder's attribute as a
//! modifier source) and cap dependency (a cached value was clamped by
//! another attribute on the same holder). Eviction walks both with a
//! worklist so it terminates and never double-visits an entry, making
//! the cascade idempotent and transitive regardless of call order.

use std::collections::HashSet;

use fit_data::AttributeId;

use crate::fit::Fit;
use crate::ids::HolderId;

/// Evicts `(holder, attr)` itself and cascades to everything that
/// depended on it. Used for manual `delete` and for edges the link
/// tracker just removed (the target's old cached value is now wrong).
pub fn evict(fit: &mut Fit, holder: HolderId, attr: AttributeId) {
    if let Some(h) = fit.holder_mut(holder) {
        h.evict_cached(attr);
    }
    evict_dependents(fit, holder, attr);
}

/// Cascades to everything that depended on `(holder, attr)` without
/// touching `(holder, attr)`'s own cache entry. Used after a manual
/// `set` (the new value stands) and after a new edge is added (the
/// target's value changes, but that's handled by evicting the target
/// directly; dependents of the *source* still need to hear about it
/// only if the source's own value changed, not on edge creation).
pub fn evict_dependents(fit: &mut Fit, holder: HolderId, attr: AttributeId) {
    let mut worklist = vec![(holder, attr)];
    let mut visited: HashSet<(HolderId, AttributeId)> = HashSet::new();

    while let Some((h, a)) = worklist.pop() {
        if !visited.insert((h, a)) {
            continue;
        }
        let mut dependents = fit.link_tracker().affector_dependents(h, a);
        dependents.extend(fit.link_tracker().cap_dependents(h, a));

        for (dep_holder, dep_attr) in dependents {
            if visited.contains(&(dep_holder, dep_attr)) {
                continue;
            }
            let evicted = fit
                .holder_mut(dep_holder)
                .map(|holder_ref| holder_ref.evict_cached(dep_attr))
                .unwrap_or(false);
            if evicted {
                fit.bump_metric("invalidate.evicted");
            }
            worklist.push((dep_holder, dep_attr));
        }
    }
}
