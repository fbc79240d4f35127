//! Runtime holder identity within `fit_engine`.
//!
//! A `HolderId` is minted by a per-fit monotonic counter and never
//! reused after detach: fits are small and long-lived relative to
//! churn, so a free list and generation counter buy nothing here.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HolderId(u64);

impl HolderId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "holder#{}", self.0)
    }
}
