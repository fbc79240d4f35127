//! Fit Services
//!
//! Configuration for the fit attribute engine: `EngineSettings`, the
//! constants the attribute calculator needs that aren't item data
//! (stacking-penalty exponent base, per-chain modifier cap, the
//! skill-level pseudo-attribute id), loaded from TOML with a sane
//! `Default` when no file is present.

pub mod error;
pub mod settings;

pub use error::ServicesError;
pub use settings::EngineSettings;
