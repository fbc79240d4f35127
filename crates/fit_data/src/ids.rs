//! Numeric identifiers used throughout the static data model.
//!
//! All identity in this crate is by plain integer id; these newtypes
//! exist only to keep the id spaces (item type, group, category,
//! attribute, effect, skill) from being accidentally swapped at call
//! sites.

use std::fmt;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(TypeId);
define_id!(GroupId);
define_id!(CategoryId);
define_id!(AttributeId);
define_id!(EffectId);
define_id!(SkillId);
