//! Errors raised while resolving numeric ids against the static data cache.

use crate::ids::{AttributeId, TypeId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("item type {0} not found in static data cache")]
    TypeNotFound(TypeId),

    #[error("attribute {0} not found in static data cache")]
    AttributeNotFound(AttributeId),
}
