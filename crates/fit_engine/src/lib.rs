//! Fit Engine
//!
//! The attribute calculation engine for a ship-fitting simulator: the
//! modifier propagation registry (`link`), the on-demand attribute
//! calculator (`attribute`), the modifier activation gate (`state`),
//! the affection resolver (`affection`), and the dependency invalidator
//! (`invalidate`), wired together by the `fit`/`holder` runtime
//! aggregate. `fit_data` owns everything static this crate reads;
//! `fit_services` owns the constants the calculator needs that aren't
//! item data.

pub mod affection;
pub mod attribute;
pub mod error;
pub mod fit;
pub mod holder;
pub mod ids;
pub mod invalidate;
pub mod link;
pub mod state;

// Re-export metrics from fit_metrics for convenience at call sites that
// instrument the engine without depending on fit_metrics directly.
#[cfg(feature = "metrics")]
pub use fit_metrics as metrics;

pub use error::FitError;
pub use fit::Fit;
pub use holder::{Holder, HolderKind};
pub use ids::HolderId;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
