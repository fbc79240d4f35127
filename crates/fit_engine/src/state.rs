//! The state/context gate.
//!
//! Decides which of a holder's modifiers are currently live, given its
//! activation state and its modifier context. Carries no state of its
//! own; every function here is pure over an `ItemType` and a `Holder`.

use fit_data::{Context, ItemType, ModifierRecord};

use crate::holder::Holder;

/// A modifier's position within its item's effect list, used as a
/// stable identity for diffing "live before" against "live after" a
/// state change, independent of whether two modifiers happen to carry
/// equal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierSlot {
    pub effect_index: usize,
    pub modifier_index: usize,
}

pub fn is_modifier_live(modifier: &ModifierRecord, holder: &Holder) -> bool {
    if holder.state() < modifier.state {
        return false;
    }
    match modifier.context {
        Context::Local => holder.is_attached(),
        Context::Projected => holder.projected_target.is_some(),
        Context::Gang => false,
    }
}

/// Every live modifier on `item`, tagged with its stable slot identity,
/// given `holder`'s current state/attachment/projection.
pub fn live_modifiers<'a>(item: &'a ItemType, holder: &Holder) -> Vec<(ModifierSlot, &'a ModifierRecord)> {
    item.effects
        .iter()
        .enumerate()
        .flat_map(|(effect_index, effect)| {
            effect
                .modifiers
                .iter()
                .enumerate()
                .map(move |(modifier_index, modifier)| (ModifierSlot { effect_index, modifier_index }, modifier))
        })
        .filter(|(_, modifier)| is_modifier_live(modifier, holder))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::HolderKind;
    use fit_data::{Effect, EffectCategory, FilterType, HolderState, Location, Operator, TypeId};

    fn modifier(state: HolderState, context: Context) -> ModifierRecord {
        ModifierRecord {
            state,
            context,
            location: Location::Ship,
            filter_type: FilterType::None,
            filter_value: None,
            operator: Operator::PostPercent,
            source_attribute_id: fit_data::AttributeId::new(1),
            target_attribute_id: fit_data::AttributeId::new(2),
        }
    }

    #[test]
    fn below_minimum_state_is_not_live() {
        let mut holder = Holder::new(HolderKind::Module, TypeId::new(1));
        // register the holder as attached but offline
        holder_attach_for_test(&mut holder);
        let m = modifier(HolderState::Active, Context::Local);
        assert!(!is_modifier_live(&m, &holder));
    }

    #[test]
    fn at_or_above_minimum_state_is_live_when_attached() {
        let mut holder = Holder::new(HolderKind::Module, TypeId::new(1));
        holder_attach_for_test(&mut holder);
        holder.set_state_raw(HolderState::Active);
        let m = modifier(HolderState::Online, Context::Local);
        assert!(is_modifier_live(&m, &holder));
    }

    #[test]
    fn detached_holder_has_no_live_local_modifiers() {
        let holder = Holder::new(HolderKind::Module, TypeId::new(1));
        let m = modifier(HolderState::Offline, Context::Local);
        assert!(!is_modifier_live(&m, &holder));
    }

    #[test]
    fn projected_modifier_needs_a_target() {
        let mut holder = Holder::new(HolderKind::Ship, TypeId::new(1));
        holder_attach_for_test(&mut holder);
        let m = modifier(HolderState::Offline, Context::Projected);
        assert!(!is_modifier_live(&m, &holder));
    }

    #[test]
    fn live_modifiers_carries_stable_slot_identity() {
        let item = fit_data::ItemType::new(TypeId::new(1), fit_data::GroupId::new(1), fit_data::CategoryId::new(1))
            .with_effect(Effect::new(EffectCategory::Passive).with_modifier(modifier(HolderState::Offline, Context::Local)));
        let mut holder = Holder::new(HolderKind::Module, TypeId::new(1));
        holder_attach_for_test(&mut holder);
        let live = live_modifiers(&item, &holder);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].0, ModifierSlot { effect_index: 0, modifier_index: 0 });
    }

    fn holder_attach_for_test(holder: &mut Holder) {
        holder.set_id(crate::ids::HolderId::new(1));
    }
}
