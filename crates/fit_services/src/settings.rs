//! Engine settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ServicesError;

/// Configuration the attribute calculator needs that isn't item data.
///
/// Loads from TOML, falling back to [`Default::default`] when no file
/// is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub stacking: StackingSettings,
    /// Numeric attribute id reserved for the skill-level pseudo-attribute
    /// that the read contract's first step checks before anything else.
    /// Defaults to `280`, the id every static data file in this
    /// workspace uses for it, but remains configurable.
    pub skill_level_attribute_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackingSettings {
    /// The stacking-penalty exponent base, `exp(-(1/2.67)^2)` by
    /// construction. Stored as the `1/2.67` divisor rather than the
    /// already-exponentiated constant so the formula stays legible at
    /// the config layer; [`StackingSettings::penalty_base`] does the
    /// `exp(-x^2)` step.
    pub penalty_divisor: f64,
    /// At most this many modifiers count per sign chain.
    pub max_counted_per_chain: usize,
}

impl StackingSettings {
    /// `P = exp(-(1/penalty_divisor)^2)`.
    pub fn penalty_base(&self) -> f64 {
        (-(1.0 / self.penalty_divisor).powi(2)).exp()
    }
}

impl Default for StackingSettings {
    fn default() -> Self {
        Self {
            penalty_divisor: 2.67,
            max_counted_per_chain: 11,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            stacking: StackingSettings::default(),
            skill_level_attribute_id: 280,
        }
    }
}

impl EngineSettings {
    /// Load settings from a TOML file, or fall back to defaults if the
    /// path does not exist. A present-but-malformed file is still an
    /// error — only a missing file is silently tolerated.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ServicesError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServicesError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ServicesError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ServicesError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_penalty_base_matches_known_constant() {
        let settings = EngineSettings::default();
        let expected = (-(1.0_f64 / 2.67).powi(2)).exp();
        assert!((settings.stacking.penalty_base() - expected).abs() < 1e-12);
    }

    #[test]
    fn default_round_trips_through_toml() {
        let settings = EngineSettings::default();
        let text = settings.to_toml().expect("serialize");
        let parsed: EngineSettings = toml::from_str(&text).expect("deserialize");
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let settings = EngineSettings::load_or_default("/nonexistent/path/fit.toml")
            .expect("missing file should not error");
        assert_eq!(settings, EngineSettings::default());
    }
}
