//! The static data cache.
//!
//! A read-only, id-keyed store built once and shared by reference
//! thereafter. It holds no process-global state — callers build one
//! explicitly and pass it to every `Fit`.

use crate::attribute::AttributeMeta;
use crate::error::DataError;
use crate::ids::{AttributeId, TypeId};
use crate::item::ItemType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pure, read-only resolver from numeric ids to static item/attribute
/// data. Implementations must be `Send + Sync`: one cache is shared
/// read-only across any number of independently-owned `Fit`s.
pub trait StaticDataCache: Send + Sync {
    fn get_type(&self, type_id: TypeId) -> Result<&ItemType, DataError>;
    fn get_attribute(&self, attribute_id: AttributeId) -> Result<&AttributeMeta, DataError>;
}

/// Plain in-memory cache, loadable from a JSON fixture. This is the
/// minimal loader the engine's tests and demo binary need to exercise
/// it, not a general-purpose data pipeline.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InMemoryStaticDataCache {
    types: HashMap<TypeId, ItemType>,
    attributes: HashMap<AttributeId, AttributeMeta>,
}

impl InMemoryStaticDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_type(&mut self, item: ItemType) -> &mut Self {
        self.types.insert(item.id, item);
        self
    }

    pub fn insert_attribute(&mut self, meta: AttributeMeta) -> &mut Self {
        self.attributes.insert(meta.id, meta);
        self
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl StaticDataCache for InMemoryStaticDataCache {
    fn get_type(&self, type_id: TypeId) -> Result<&ItemType, DataError> {
        self.types
            .get(&type_id)
            .ok_or(DataError::TypeNotFound(type_id))
    }

    fn get_attribute(&self, attribute_id: AttributeId) -> Result<&AttributeMeta, DataError> {
        self.attributes
            .get(&attribute_id)
            .ok_or(DataError::AttributeNotFound(attribute_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemType};

    #[test]
    fn missing_type_is_not_found() {
        let cache = InMemoryStaticDataCache::new();
        assert_eq!(
            cache.get_type(TypeId::new(1)).unwrap_err(),
            DataError::TypeNotFound(TypeId::new(1))
        );
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut cache = InMemoryStaticDataCache::new();
        let item = ItemType::new(
            TypeId::new(1),
            crate::ids::GroupId::new(1),
            crate::ids::CategoryId::new(1),
        );
        cache.insert_type(item.clone());
        assert_eq!(cache.get_type(TypeId::new(1)).unwrap(), &item);
    }
}
