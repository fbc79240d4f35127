//! Fit Data
//!
//! Static data model for the fit attribute engine: item types, attribute
//! metadata, effects, and compiled modifier records, plus the
//! `StaticDataCache` that resolves numeric ids to them.
//!
//! Parsing expression trees into modifier records, and
//! serializing/deserializing the authoritative static data dump, are
//! both out of scope here — this crate models the *shape* an
//! effect→modifier compiler already produced, plus a minimal JSON
//! loader for tests and the demo binary.

pub mod attribute;
pub mod cache;
pub mod effect;
pub mod error;
pub mod ids;
pub mod item;
pub mod modifier;

pub use attribute::AttributeMeta;
pub use cache::{InMemoryStaticDataCache, StaticDataCache};
pub use effect::{Effect, EffectCategory};
pub use error::DataError;
pub use ids::{AttributeId, CategoryId, EffectId, GroupId, SkillId, TypeId};
pub use item::{ItemType, SlotKind};
pub use modifier::{
    Context, FilterType, FilterValue, HolderState, Location, ModifierRecord, Operator, SourceType,
};
