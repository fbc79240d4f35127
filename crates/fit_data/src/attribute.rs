//! Static attribute metadata.

use crate::ids::AttributeId;
use serde::{Deserialize, Serialize};

/// Metadata describing one numeric attribute id.
///
/// `default_value` absent means a holder must supply its own base value
/// for this attribute or the read fails. `stackable` false is what makes
/// a modifier on this attribute eligible for the stacking penalty.
/// `max_attribute_id` wires up a capping relationship to another
/// attribute on the same holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMeta {
    pub id: AttributeId,
    pub default_value: Option<f64>,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub high_is_good: bool,
    #[serde(default)]
    pub max_attribute_id: Option<AttributeId>,
}

impl AttributeMeta {
    pub fn new(id: AttributeId) -> Self {
        Self {
            id,
            default_value: None,
            stackable: false,
            high_is_good: false,
            max_attribute_id: None,
        }
    }

    pub fn with_default(mut self, value: f64) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    pub fn high_is_good(mut self, high_is_good: bool) -> Self {
        self.high_is_good = high_is_good;
        self
    }

    pub fn capped_by(mut self, max_attribute_id: AttributeId) -> Self {
        self.max_attribute_id = Some(max_attribute_id);
        self
    }
}
