//! `FitError`, the single error type surfaced by every fallible public
//! entry point.
//!
//! Degrade-and-log paths inside the attribute calculator (operator
//! error, source-read error) never construct one of these at all — they
//! are logged through `tracing` and skipped in place instead.

use fit_data::{AttributeId, TypeId};
use thiserror::Error;

use crate::ids::HolderId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FitError {
    #[error("attribute {attribute} not found on holder with item {item}")]
    KeyNotFound { item: TypeId, attribute: AttributeId },

    #[error("holder has no recognized fit position for a self+filter modifier")]
    BadContainer,

    #[error("holder {0} is already attached to a fit")]
    AlreadyAttached(HolderId),

    #[error("holder {holder} requested state above its item's allowed maximum")]
    StateNotAllowed { holder: HolderId },

    #[error("holder {0} cannot be projected (its item is not targeted)")]
    NotProjectable(HolderId),

    #[error("holder {0} has no current projection target")]
    NoProjectionTarget(HolderId),

    #[error("holder {0} is not attached to this fit")]
    NotInFit(HolderId),
}
