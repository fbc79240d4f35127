//! The attribute calculator.
//!
//! Per-holder cache of computed attribute values; entry point for every
//! read, performing the full calculation on a cache miss. This module
//! owns the read contract, the operator-bucketing/stacking-penalty
//! pipeline, and the capping step; [`crate::link::LinkTracker`] supplies
//! the live affectors and [`crate::invalidate`] handles eviction once a
//! value changes underneath a cached entry.

use fit_data::{AttributeId, AttributeMeta, Operator, StaticDataCache};

use crate::error::FitError;
use crate::fit::Fit;
use crate::holder::Holder;
use crate::ids::HolderId;
use crate::stacking;

/// Read `holder[attr]` through the full read contract: the skill-level
/// shortcut, then cache-or-compute.
///
/// Detached holders never reach this function — there is no `HolderId`
/// to look one up by until [`crate::fit::Fit::attach`] mints one. Use
/// [`read_detached`] directly for a holder that has not been attached to
/// any fit yet.
pub fn read(
    fit: &mut Fit,
    cache: &dyn StaticDataCache,
    holder_id: HolderId,
    attr: AttributeId,
) -> Result<f64, FitError> {
    let skill_level_attr = fit.settings().skill_level_attribute_id;
    let holder = fit.holder(holder_id).ok_or(FitError::NotInFit(holder_id))?;

    if attr.raw() == skill_level_attr {
        if let Some(level) = holder.skill_level {
            return Ok(level as f64);
        }
    }

    if let Some(value) = holder.cached(attr) {
        fit.bump_metric("attribute.cache_hit");
        return Ok(value);
    }

    compute(fit, cache, holder_id, attr)
}

/// Base value of `attr` on a holder that is not, and may never be,
/// attached to any fit.
///
/// Checks the skill-level shortcut first, exactly like [`read`] does for
/// an attached holder: a skill holder reading the skill-level
/// pseudo-attribute id gets its level back regardless of attachment.
/// Otherwise this is just the item's own attribute table or the
/// attribute's default, since no modifiers apply to a detached holder.
/// Fails with [`FitError::KeyNotFound`] when neither gives a value.
pub fn read_detached(
    holder: &Holder,
    cache: &dyn StaticDataCache,
    skill_level_attr: u32,
    attr: AttributeId,
) -> Result<f64, FitError> {
    if attr.raw() == skill_level_attr {
        if let Some(level) = holder.skill_level {
            return Ok(level as f64);
        }
    }

    let not_found = || FitError::KeyNotFound { item: holder.item_id, attribute: attr };
    let item = cache.get_type(holder.item_id).map_err(|_| not_found())?;
    let default = cache.get_attribute(attr).ok().and_then(|m| m.default_value);
    item.attributes.get(&attr).copied().or(default).ok_or_else(not_found)
}

/// Which of the nine duration operator codes normalizes to which
/// aggregation class. Index into the fixed-order bucket array below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BucketKind {
    Assignment,
    Add,
    Mult,
}

/// Position of each duration operator in the fixed application order:
/// `preAssignment, preMul, preDiv, modAdd, modSub, postMul, postDiv,
/// postPercent, postAssignment`.
fn bucket_slot(op: Operator) -> Option<(usize, BucketKind)> {
    match op {
        Operator::PreAssignment => Some((0, BucketKind::Assignment)),
        Operator::PreMul => Some((1, BucketKind::Mult)),
        Operator::PreDiv => Some((2, BucketKind::Mult)),
        Operator::ModAdd => Some((3, BucketKind::Add)),
        Operator::ModSub => Some((4, BucketKind::Add)),
        Operator::PostMul => Some((5, BucketKind::Mult)),
        Operator::PostDiv => Some((6, BucketKind::Mult)),
        Operator::PostPercent => Some((7, BucketKind::Mult)),
        Operator::PostAssignment => Some((8, BucketKind::Assignment)),
        Operator::Increment | Operator::Decrement | Operator::InstantAssignment => None,
    }
}

const BUCKET_COUNT: usize = 9;

/// Normalizes one affector's raw source value into its aggregation
/// class and numeric contribution.
fn normalize(op: Operator, source_value: f64) -> Option<(BucketKind, f64)> {
    let (_, kind) = bucket_slot(op)?;
    let value = match op {
        Operator::PreAssignment | Operator::PostAssignment => source_value,
        Operator::PreMul | Operator::PostMul => source_value,
        Operator::PreDiv | Operator::PostDiv => 1.0 / source_value,
        Operator::PostPercent => source_value / 100.0 + 1.0,
        Operator::ModAdd => source_value,
        Operator::ModSub => -source_value,
        Operator::Increment | Operator::Decrement | Operator::InstantAssignment => unreachable!(),
    };
    Some((kind, value))
}

/// A normalized multiplicative value is eligible for the stacking
/// penalty iff the target attribute isn't `stackable`, the affector's
/// source holder kind isn't exempt, and the *original* operator (not
/// the normalized class) is one of the five multiplicative codes.
fn is_penalized(metadata: &AttributeMeta, source_kind: crate::holder::HolderKind, op: Operator) -> bool {
    !metadata.stackable
        && !source_kind.exempt_from_stacking_penalty()
        && matches!(
            op,
            Operator::PreMul | Operator::PostMul | Operator::PostPercent | Operator::PreDiv | Operator::PostDiv
        )
}

/// Performs the full compute path for `(holder_id, attr)` and caches
/// the result: resolves metadata and base value, gathers live
/// affectors, normalizes and stacking-penalizes them into duration
/// buckets, applies the buckets in fixed operator order, caps, and
/// stores.
fn compute(
    fit: &mut Fit,
    cache: &dyn StaticDataCache,
    holder_id: HolderId,
    attr: AttributeId,
) -> Result<f64, FitError> {
    fit.bump_metric("attribute.compute");

    let holder = fit.holder(holder_id).ok_or(FitError::NotInFit(holder_id))?;
    let item_id = holder.item_id;

    // attribute metadata
    let metadata = match cache.get_attribute(attr) {
        Ok(meta) => meta.clone(),
        Err(_) => {
            tracing::error!(
                exception_type = "MetaError",
                item_id = item_id.raw(),
                offending_id = attr.raw(),
                child_name = "attributeCalculator",
                "attribute metadata not found"
            );
            return Err(FitError::KeyNotFound { item: item_id, attribute: attr });
        }
    };

    let item = cache
        .get_type(item_id)
        .map_err(|_| FitError::KeyNotFound { item: item_id, attribute: attr })?;

    // base value
    let mut result = match item.attributes.get(&attr).copied().or(metadata.default_value) {
        Some(v) => v,
        None => {
            tracing::warn!(
                exception_type = "BaseValueError",
                item_id = item_id.raw(),
                offending_id = attr.raw(),
                child_name = "attributeCalculator",
                "neither base value nor attribute default present"
            );
            return Err(FitError::KeyNotFound { item: item_id, attribute: attr });
        }
    };

    // affectors — an owned snapshot, so the borrow of `fit` ends here
    // and recursive reads below can take `&mut Fit` freely.
    let affectors = fit.link_tracker().affectors(holder_id, attr);

    let mut buckets: [(Vec<f64>, Vec<f64>); BUCKET_COUNT] = std::array::from_fn(|_| (Vec::new(), Vec::new()));

    for affector in affectors {
        let Some(source_holder) = fit.holder(affector.source) else { continue };
        let source_kind = source_holder.kind;
        let source_item_id = source_holder.item_id;
        let modifier = affector.modifier;

        // source value — silent skip on failure, the source's own
        // read path already logged the root cause.
        let Ok(source_value) = read(fit, cache, affector.source, modifier.source_attribute_id) else {
            continue;
        };

        // normalize, or log+skip an operator this engine never applies.
        let Some((kind, value)) = normalize(modifier.operator, source_value) else {
            tracing::warn!(
                exception_type = "OperatorError",
                item_id = source_item_id.raw(),
                offending_id = modifier.operator as u32,
                child_name = "attributeCalculator",
                "modifier carries an operator this engine does not apply"
            );
            continue;
        };

        let (slot, expected_kind) = bucket_slot(modifier.operator).expect("normalize already validated this operator");
        debug_assert_eq!(kind, expected_kind);

        // classify penalized vs. normal.
        if is_penalized(&metadata, source_kind, modifier.operator) {
            buckets[slot].1.push(value);
        } else {
            buckets[slot].0.push(value);
        }
    }

    let penalty_base = fit.settings().stacking.penalty_base();
    let max_counted = fit.settings().stacking.max_counted_per_chain;

    // fold each operator's penalized sub-bucket into one aggregated
    // multiplier appended to its normal sub-bucket.
    for (normal, penalized) in buckets.iter_mut() {
        if !penalized.is_empty() {
            normal.push(stacking::stacking_multiplier(penalized, penalty_base, max_counted));
        }
    }

    // apply in fixed operator order.
    for slot in 0..BUCKET_COUNT {
        let kind = bucket_kind_of(slot);
        let normal = &buckets[slot].0;
        if normal.is_empty() {
            continue;
        }
        match kind {
            BucketKind::Assignment => {
                result = if metadata.high_is_good {
                    normal.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                } else {
                    normal.iter().copied().fold(f64::INFINITY, f64::min)
                };
            }
            BucketKind::Add => {
                for v in normal {
                    result += v;
                }
            }
            BucketKind::Mult => {
                for v in normal {
                    result *= v;
                }
            }
        }
    }

    // capping.
    if let Some(cap_attr) = metadata.max_attribute_id {
        if let Ok(cap_value) = read(fit, cache, holder_id, cap_attr) {
            result = result.min(cap_value);
            fit.link_tracker_mut().record_cap(holder_id, attr, cap_attr);
        }
    }

    // store and return.
    if let Some(holder) = fit.holder_mut(holder_id) {
        holder.store_cached(attr, result);
    }
    Ok(result)
}

fn bucket_kind_of(slot: usize) -> BucketKind {
    match slot {
        0 | 8 => BucketKind::Assignment,
        3 | 4 => BucketKind::Add,
        1 | 2 | 5 | 6 | 7 => BucketKind::Mult,
        _ => unreachable!("only 9 duration operator slots exist"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::{Holder, HolderKind};
    use fit_data::{
        AttributeId as Attr, CategoryId, Context, Effect, EffectCategory, FilterType, FilterValue,
        GroupId, InMemoryStaticDataCache, ItemType, Location, ModifierRecord, SkillId, TypeId,
    };

    fn meta(id: u32) -> AttributeMeta {
        AttributeMeta::new(Attr::new(id))
    }

    fn modifier(
        location: Location,
        filter_type: FilterType,
        filter_value: Option<FilterValue>,
        operator: Operator,
        source_attr: u32,
        target_attr: u32,
    ) -> ModifierRecord {
        ModifierRecord {
            state: fit_data::HolderState::Offline,
            context: Context::Local,
            location,
            filter_type,
            filter_value,
            operator,
            source_attribute_id: Attr::new(source_attr),
            target_attribute_id: Attr::new(target_attr),
        }
    }

    #[test]
    fn passive_percent_modifier_chain_reacts_to_character_attach_and_detach() {
        // Character: attr1 = 5, modifies ship's attr2 via postPercent.
        let character_item = ItemType::new(TypeId::new(10), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(1), 5.0)
            .with_effect(Effect::new(EffectCategory::Passive).with_modifier(modifier(
                Location::Ship,
                FilterType::None,
                None,
                Operator::PostPercent,
                1,
                2,
            )));
        // Ship: attr2 = 7.5, modifies every module's attr3 via postPercent.
        let ship_item = ItemType::new(TypeId::new(20), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(2), 7.5)
            .with_effect(Effect::new(EffectCategory::Passive).with_modifier(modifier(
                Location::Ship,
                FilterType::All,
                None,
                Operator::PostPercent,
                2,
                3,
            )));
        let module_item = ItemType::new(TypeId::new(30), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(3), 0.5);

        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_type(character_item);
        cache.insert_type(ship_item);
        cache.insert_type(module_item);
        cache.insert_attribute(meta(1).stackable(true));
        cache.insert_attribute(meta(2).stackable(true));
        cache.insert_attribute(meta(3).stackable(true));

        let mut fit = Fit::new(fit_services::EngineSettings::default());
        let ship_id = fit.attach(&cache, Holder::new(HolderKind::Ship, TypeId::new(20))).unwrap();
        let module_id = fit.attach(&cache, Holder::new(HolderKind::Module, TypeId::new(30))).unwrap();

        let before = read(&mut fit, &cache, module_id, Attr::new(3)).unwrap();
        assert!((before - 0.5375).abs() < 1e-9, "got {before}");

        let character_id = fit
            .attach(&cache, Holder::new(HolderKind::Character, TypeId::new(10)))
            .unwrap();
        let with_character = read(&mut fit, &cache, module_id, Attr::new(3)).unwrap();
        assert!((with_character - 0.539375).abs() < 1e-9, "got {with_character}");

        fit.detach(&cache, character_id).unwrap();
        let _ = ship_id;
        let after = read(&mut fit, &cache, module_id, Attr::new(3)).unwrap();
        assert!((after - 0.5375).abs() < 1e-9, "got {after}");
    }

    #[test]
    fn ship_self_position_with_all_filter_affects_and_restores_siblings() {
        let ship_item = ItemType::new(TypeId::new(1), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(1), 20.0)
            .with_effect(Effect::new(EffectCategory::Passive).with_modifier(modifier(
                Location::Ship,
                FilterType::All,
                None,
                Operator::PostPercent,
                1,
                2,
            )));
        let module_item =
            ItemType::new(TypeId::new(2), GroupId::new(1), CategoryId::new(1)).with_attribute(Attr::new(2), 100.0);

        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_type(ship_item);
        cache.insert_type(module_item);
        cache.insert_attribute(meta(1).stackable(true));
        cache.insert_attribute(meta(2).stackable(true));

        let mut fit = Fit::new(fit_services::EngineSettings::default());
        let ship_id = fit.attach(&cache, Holder::new(HolderKind::Ship, TypeId::new(1))).unwrap();
        let module_id = fit.attach(&cache, Holder::new(HolderKind::Module, TypeId::new(2))).unwrap();

        let modified = read(&mut fit, &cache, module_id, Attr::new(2)).unwrap();
        assert!((modified - 100.0).abs() > 1e-9);
        assert!((modified - 120.0).abs() < 1e-9);

        fit.detach(&cache, ship_id).unwrap();
        let restored = read(&mut fit, &cache, module_id, Attr::new(2)).unwrap();
        assert_eq!(restored, 100.0);
    }

    #[test]
    fn skill_requirement_filter_matches_self_type_sentinel() {
        let source_item = ItemType::new(TypeId::new(772), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(1), 20.0)
            .with_effect(Effect::new(EffectCategory::Passive).with_modifier(modifier(
                Location::Ship,
                FilterType::Skill,
                Some(FilterValue::SelfType),
                Operator::PostPercent,
                1,
                2,
            )));
        let matching_target = ItemType::new(TypeId::new(2), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(2), 100.0)
            .requiring_skill(SkillId::new(772), 1);
        let non_matching_target = ItemType::new(TypeId::new(3), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(2), 100.0)
            .requiring_skill(SkillId::new(51), 1);

        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_type(source_item);
        cache.insert_type(matching_target);
        cache.insert_type(non_matching_target);
        cache.insert_attribute(meta(1).stackable(true));
        cache.insert_attribute(meta(2).stackable(true));

        let mut fit = Fit::new(fit_services::EngineSettings::default());
        fit.attach(&cache, Holder::new(HolderKind::Ship, TypeId::new(772))).unwrap();
        let matched_id = fit.attach(&cache, Holder::new(HolderKind::Module, TypeId::new(2))).unwrap();
        let unmatched_id = fit.attach(&cache, Holder::new(HolderKind::Module, TypeId::new(3))).unwrap();

        let matched = read(&mut fit, &cache, matched_id, Attr::new(2)).unwrap();
        assert!((matched - 120.0).abs() < 1e-9);

        let unmatched = read(&mut fit, &cache, unmatched_id, Attr::new(2)).unwrap();
        assert_eq!(unmatched, 100.0);
    }

    #[test]
    fn chain_invalidation_restores_downstream_on_removal() {
        // A (group 1) modifies B (group 2) attr10 via postPercent from
        // A's attr9; B modifies C (group 3) attr10 via postPercent from
        // its own (possibly-modified) attr10. Removing A must restore
        // C to the value computed with only B's unmodified base.
        let a_item = ItemType::new(TypeId::new(1), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(9), 50.0)
            .with_effect(Effect::new(EffectCategory::Passive).with_modifier(modifier(
                Location::Ship,
                FilterType::Group,
                Some(FilterValue::Value(2)),
                Operator::PostPercent,
                9,
                10,
            )));
        let b_item = ItemType::new(TypeId::new(2), GroupId::new(2), CategoryId::new(1))
            .with_attribute(Attr::new(10), 10.0)
            .with_effect(Effect::new(EffectCategory::Passive).with_modifier(modifier(
                Location::Ship,
                FilterType::Group,
                Some(FilterValue::Value(3)),
                Operator::PostPercent,
                10,
                10,
            )));
        let c_item =
            ItemType::new(TypeId::new(3), GroupId::new(3), CategoryId::new(1)).with_attribute(Attr::new(10), 100.0);

        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_type(a_item);
        cache.insert_type(b_item);
        cache.insert_type(c_item);
        cache.insert_attribute(meta(9).stackable(true));
        cache.insert_attribute(meta(10).stackable(true));

        let mut fit = Fit::new(fit_services::EngineSettings::default());
        let a_id = fit.attach(&cache, Holder::new(HolderKind::Module, TypeId::new(1))).unwrap();
        fit.attach(&cache, Holder::new(HolderKind::Module, TypeId::new(2))).unwrap();
        let c_id = fit.attach(&cache, Holder::new(HolderKind::Module, TypeId::new(3))).unwrap();

        let modified = read(&mut fit, &cache, c_id, Attr::new(10)).unwrap();
        assert!((modified - 115.0).abs() < 1e-9, "got {modified}");

        fit.detach(&cache, a_id).unwrap();
        let restored = read(&mut fit, &cache, c_id, Attr::new(10)).unwrap();
        assert!((restored - 110.0).abs() < 1e-9, "got {restored}");
    }

    #[test]
    fn operator_ordering_add_precedes_post_mul() {
        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_attribute(meta(100).stackable(true));
        cache.insert_attribute(meta(1).stackable(true));
        cache.insert_attribute(meta(2).stackable(true));

        let target_item = ItemType::new(TypeId::new(1), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(100), 5.0)
            .with_effect(
                Effect::new(EffectCategory::Passive)
                    .with_modifier(modifier(Location::Ship, FilterType::All, None, Operator::PostMul, 1, 100))
                    .with_modifier(modifier(Location::Ship, FilterType::All, None, Operator::ModAdd, 2, 100)),
            );
        let source_item = ItemType::new(TypeId::new(2), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(1), 2.0)
            .with_attribute(Attr::new(2), 10.0);
        cache.insert_type(target_item);
        cache.insert_type(source_item);

        let mut fit = Fit::new(fit_services::EngineSettings::default());
        let ship_id = fit.attach(&cache, Holder::new(HolderKind::Ship, TypeId::new(1))).unwrap();
        fit.attach(&cache, Holder::new(HolderKind::Module, TypeId::new(2))).unwrap();

        let result = read(&mut fit, &cache, ship_id, Attr::new(100)).unwrap();
        assert!((result - 30.0).abs() < 1e-9, "got {result}");
    }

    #[test]
    fn operator_ordering_pre_mul_precedes_add() {
        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_attribute(meta(100).stackable(true));
        cache.insert_attribute(meta(1).stackable(true));
        cache.insert_attribute(meta(2).stackable(true));

        let target_item = ItemType::new(TypeId::new(1), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(100), 5.0)
            .with_effect(
                Effect::new(EffectCategory::Passive)
                    .with_modifier(modifier(Location::Ship, FilterType::All, None, Operator::PreMul, 1, 100))
                    .with_modifier(modifier(Location::Ship, FilterType::All, None, Operator::ModAdd, 2, 100)),
            );
        let source_item = ItemType::new(TypeId::new(2), GroupId::new(1), CategoryId::new(1))
            .with_attribute(Attr::new(1), 2.0)
            .with_attribute(Attr::new(2), 10.0);
        cache.insert_type(target_item);
        cache.insert_type(source_item);

        let mut fit = Fit::new(fit_services::EngineSettings::default());
        let ship_id = fit.attach(&cache, Holder::new(HolderKind::Ship, TypeId::new(1))).unwrap();
        fit.attach(&cache, Holder::new(HolderKind::Module, TypeId::new(2))).unwrap();

        let result = read(&mut fit, &cache, ship_id, Attr::new(100)).unwrap();
        assert!((result - 20.0).abs() < 1e-9, "got {result}");
    }

    #[test]
    fn capping_law_invalidates_on_cap_source_change() {
        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_attribute(meta(1).with_default(0.0).capped_by(Attr::new(2)));
        cache.insert_attribute(meta(2).with_default(50.0));
        cache.insert_type(
            ItemType::new(TypeId::new(1), GroupId::new(1), CategoryId::new(1)).with_attribute(Attr::new(1), 70.0),
        );

        let mut fit = Fit::new(fit_services::EngineSettings::default());
        let id = fit.attach(&cache, Holder::new(HolderKind::Ship, TypeId::new(1))).unwrap();

        let capped = read(&mut fit, &cache, id, Attr::new(1)).unwrap();
        assert_eq!(capped, 50.0);

        fit.set_override(id, Attr::new(2), 70.0).unwrap();
        let recomputed = read(&mut fit, &cache, id, Attr::new(1)).unwrap();
        assert_eq!(recomputed, 70.0);
    }

    #[test]
    fn detached_read_falls_back_to_attribute_default() {
        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_attribute(meta(1).with_default(42.0));
        cache.insert_type(ItemType::new(TypeId::new(1), GroupId::new(1), CategoryId::new(1)));

        let holder = Holder::new(HolderKind::Module, TypeId::new(1));
        let value = read_detached(&holder, &cache, 999, Attr::new(1));
        assert_eq!(value, Ok(42.0));
    }

    #[test]
    fn detached_read_fails_without_base_or_default() {
        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_attribute(meta(1));
        cache.insert_type(ItemType::new(TypeId::new(1), GroupId::new(1), CategoryId::new(1)));

        let holder = Holder::new(HolderKind::Module, TypeId::new(1));
        let value = read_detached(&holder, &cache, 999, Attr::new(1));
        assert!(value.is_err());
    }

    #[test]
    fn detached_read_honors_skill_level_shortcut_before_base_lookup() {
        let mut cache = InMemoryStaticDataCache::new();
        cache.insert_attribute(meta(280));
        cache.insert_type(ItemType::new(TypeId::new(772), GroupId::new(1), CategoryId::new(1)));

        let mut holder = Holder::new(HolderKind::Skill, TypeId::new(772));
        holder.skill_level = Some(4);
        let value = read_detached(&holder, &cache, 280, Attr::new(280));
        assert_eq!(value, Ok(4.0));
    }
}
