//! The affection resolver.
//!
//! Given `(sourceHolder, modifier)`, returns the concrete holders it
//! currently targets. Pure with respect to the fit: it only reads
//! holder state and the static cache, never mutates anything.

use fit_data::{FilterType, FilterValue, Location, ModifierRecord, StaticDataCache};

use crate::error::FitError;
use crate::fit::Fit;
use crate::holder::HolderKind;
use crate::ids::HolderId;

/// Resolves a modifier's targets within `fit`. Returns `Ok(vec![])` for
/// the reserved/inert cases (`gang`, `area`, `space`, an unset
/// projection), and `Err(FitError::BadContainer)` only for the one hard
/// failure: a `self` location combined with any filter other than
/// `none`, which can never name a container.
pub fn resolve(
    fit: &Fit,
    cache: &dyn StaticDataCache,
    source: HolderId,
    modifier: &ModifierRecord,
) -> Result<Vec<HolderId>, FitError> {
    if modifier.context == fit_data::Context::Gang {
        return Ok(Vec::new());
    }

    let located = match modifier.location {
        Location::Slf => {
            if modifier.filter_targets_container() {
                return Err(FitError::BadContainer);
            }
            vec![source]
        }
        Location::Character => match fit.character_id() {
            Some(id) => vec![id],
            None => Vec::new(),
        },
        Location::Ship => match fit.ship_id() {
            Some(id) => vec![id],
            None => Vec::new(),
        },
        Location::Target => {
            let Some(holder) = fit.holder(source) else {
                return Ok(Vec::new());
            };
            match holder.projected_target {
                Some(target) => vec![target],
                None => Vec::new(),
            }
        }
        Location::Other => {
            let Some(holder) = fit.holder(source) else {
                return Ok(Vec::new());
            };
            match holder.container_link {
                Some(other) => vec![other],
                None => Vec::new(),
            }
        }
        Location::Area | Location::Space => Vec::new(),
    };

    if modifier.filter_type == FilterType::None {
        return Ok(located);
    }

    // `all`/`group`/`skill` only make sense when `location` resolved to
    // a container (ship or character); expand the single container
    // holder into its membership.
    let container_location = match modifier.location {
        Location::Character => Location::Character,
        Location::Ship => Location::Ship,
        _ => return Ok(Vec::new()),
    };

    let members = fit.members_of_container(container_location);
    let mut targets = Vec::new();
    for member in members {
        let Some(holder) = fit.holder(member) else { continue };
        let matches = match modifier.filter_type {
            FilterType::None => true,
            FilterType::All => true,
            FilterType::Group => {
                let Ok(item) = cache.get_type(holder.item_id) else { continue };
                matches!(modifier.filter_value, Some(FilterValue::Value(g)) if item.group_id.raw() == g)
            }
            FilterType::Skill => {
                let Ok(item) = cache.get_type(holder.item_id) else { continue };
                match modifier.filter_value {
                    Some(FilterValue::Value(skill)) => item
                        .required_skills
                        .keys()
                        .any(|id| id.raw() == skill),
                    Some(FilterValue::SelfType) => {
                        let Some(source_holder) = fit.holder(source) else { continue };
                        item.required_skills
                            .keys()
                            .any(|id| id.raw() == source_holder.item_id.raw())
                    }
                    None => false,
                }
            }
        };
        if matches {
            targets.push(member);
        }
    }
    Ok(targets)
}

/// Whether `kind` can itself be the argument to `self`+filter, i.e.
/// whether it has a recognized position (ship/character are positions
/// in themselves; everything else sits inside one). `self` with
/// `filter=none` is always fine regardless — only `self`+filter fails,
/// and that is rejected unconditionally in [`resolve`] above since
/// `self` never names a container no matter the holder's kind. This
/// helper remains for callers that want to pre-validate before
/// registering a holder.
pub fn has_recognized_fit_position(kind: HolderKind) -> bool {
    kind.fit_slot().is_some() || kind.member_of().is_some()
}
