//! Centralized error types for the quay workspace.

use crate::types::{CargoId, EntryId, LocationId, PermitId, TruckId};
use thiserror::Error;

/// Top-level error enum. Every fallible engine operation resolves to one of
/// these variants; callers match on the variant, not on message text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuayError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("location {0} is already occupied")]
    AlreadyOccupied(LocationId),

    #[error("location {0} is inactive")]
    LocationInactive(LocationId),

    #[error("location {0} is not occupied")]
    NotOccupied(LocationId),

    #[error("destination {0} is already occupied")]
    DestinationOccupied(LocationId),

    #[error("supplied origin {supplied} does not match current location {actual:?}")]
    OriginMismatch {
        supplied: LocationId,
        actual: Option<LocationId>,
    },

    #[error("truck {0} already has a waiting queue entry")]
    AlreadyQueued(TruckId),

    #[error("queue entry {0} is not waiting")]
    NotWaiting(EntryId),

    #[error("permit {0} is not pending")]
    PermitNotPending(PermitId),

    #[error("location {0} is locked by a concurrent operation")]
    Locked(LocationId),

    #[error("cargo {0} is not eligible for movement")]
    CargoNotMovable(CargoId),

    #[error("store error: {0}")]
    Store(String),
}

impl QuayError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True for resource-contention outcomes the caller may surface as a
    /// user-facing conflict (HTTP 409 class) rather than a lookup failure.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyOccupied(_)
                | Self::NotOccupied(_)
                | Self::DestinationOccupied(_)
                | Self::AlreadyQueued(_)
                | Self::NotWaiting(_)
                | Self::PermitNotPending(_)
                | Self::Locked(_)
        )
    }
}

pub type QuayResult<T> = Result<T, QuayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_classification() {
        assert!(QuayError::AlreadyOccupied(LocationId::from("Z101")).is_conflict());
        assert!(QuayError::Locked(LocationId::from("Z101")).is_conflict());
        assert!(!QuayError::not_found("cargo", "C-42").is_conflict());
        assert!(!QuayError::Store("disk on fire".into()).is_conflict());
    }
}
