//! Compiled modifier records and the enums that drive them.

use crate::ids::AttributeId;
use serde::{Deserialize, Serialize};

/// Total ordering over holder activation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum HolderState {
    Offline = 0,
    Online = 1,
    Active = 2,
    Overload = 3,
}

/// Which fit a `projected`/`gang` modifier searches for targets in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Context {
    Local,
    Gang,
    Projected,
}

/// Location codes a modifier can anchor against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Slf = 1,
    Character = 2,
    Ship = 3,
    Target = 4,
    Other = 5,
    Area = 6,
    Space = 7,
}

/// Filter-type codes narrowing a location down to a subset of its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    None,
    All,
    Group,
    Skill,
}

/// A `filterValue` is either a concrete numeric value or the "self-type"
/// sentinel, which the skill filter treats as "the source holder's own
/// item type id".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterValue {
    Value(u32),
    SelfType,
}

/// Operator codes. Ordinal order is the duration-bucket application
/// order for the nine duration operators; the three instant operators
/// are modeled for round-tripping compiled records but are never
/// applied by this engine (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    PreAssignment = 1,
    PreMul = 2,
    PreDiv = 3,
    ModAdd = 4,
    ModSub = 5,
    PostMul = 6,
    PostDiv = 7,
    PostPercent = 8,
    PostAssignment = 9,
    Increment = 10,
    Decrement = 11,
    InstantAssignment = 12,
}

impl Operator {
    /// `true` for the nine operators the duration engine normalizes and
    /// aggregates; `false` for the three instant operators, which are
    /// out of scope here and always rejected by the normalization step
    /// as an operator error.
    pub fn is_duration(self) -> bool {
        !matches!(
            self,
            Operator::Increment | Operator::Decrement | Operator::InstantAssignment
        )
    }
}

/// Source-type codes: where a modifier's source value comes from. The
/// engine only ever resolves `AttributeId` sources (it reads
/// `sourceAttributeId` off the source holder); `Literal` is modeled for
/// completeness of the compiled-record shape, but a modifier compiler
/// that emits a literal source would, in a full system, fold it to a
/// constant before this engine ever sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    AttributeId,
    Literal,
}

/// One compiled modifier record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierRecord {
    pub state: HolderState,
    pub context: Context,
    pub location: Location,
    pub filter_type: FilterType,
    pub filter_value: Option<FilterValue>,
    pub operator: Operator,
    pub source_attribute_id: AttributeId,
    pub target_attribute_id: AttributeId,
}

impl ModifierRecord {
    /// A modifier with `filter_type = None` is only valid when `location`
    /// names a single holder; `All`/`Group`/`Skill` require a container
    /// location (`character`/`ship`).
    pub fn filter_targets_container(&self) -> bool {
        matches!(
            self.filter_type,
            FilterType::All | FilterType::Group | FilterType::Skill
        )
    }
}
