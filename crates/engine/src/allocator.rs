//! Exclusive yard-slot allocation.
//!
//! The only component allowed to flip a location between free and occupied.
//! Carries no business context, so it emits no audit records; callers that
//! know why a slot changed hands are responsible for the trail.

use quay_core::error::{QuayError, QuayResult};
use quay_core::types::{CargoId, LocationId};
use quay_store::{LocationStore, LockRegistry};
use std::sync::Arc;

/// Behavior switches for the allocator.
#[derive(Debug, Clone, Copy)]
pub struct AllocatorConfig {
    /// When `true` (the historical behavior), releasing a location that is
    /// not occupied is a silent no-op success. The strict mode turns it
    /// into [`QuayError::NotOccupied`].
    pub allow_release_of_unrelated: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            allow_release_of_unrelated: true,
        }
    }
}

pub struct SlotAllocator<S> {
    store: Arc<S>,
    locks: Arc<LockRegistry>,
    config: AllocatorConfig,
}

impl<S: LocationStore> SlotAllocator<S> {
    pub fn new(store: Arc<S>, locks: Arc<LockRegistry>) -> Self {
        Self::with_config(store, locks, AllocatorConfig::default())
    }

    pub fn with_config(store: Arc<S>, locks: Arc<LockRegistry>, config: AllocatorConfig) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    pub fn config(&self) -> AllocatorConfig {
        self.config
    }

    /// Marks `location_id` occupied by `cargo_id`.
    pub fn allocate(&self, location_id: &LocationId, cargo_id: &CargoId) -> QuayResult<()> {
        let _guard = self.locks.acquire(location_id)?;
        self.allocate_locked(location_id, cargo_id)
    }

    /// Clears the occupancy of `location_id`.
    ///
    /// Releasing an already-free location succeeds in the default
    /// (permissive) configuration; see [`AllocatorConfig`].
    pub fn release(&self, location_id: &LocationId) -> QuayResult<()> {
        let _guard = self.locks.acquire(location_id)?;
        self.release_locked(location_id)
    }

    /// Occupancy write without taking the location lock. The caller must
    /// already hold the [`LockRegistry`] guard for `location_id`.
    pub(crate) fn allocate_locked(
        &self,
        location_id: &LocationId,
        cargo_id: &CargoId,
    ) -> QuayResult<()> {
        let mut location = self
            .store
            .location(location_id)?
            .ok_or_else(|| QuayError::not_found("location", location_id))?;

        if !location.active {
            return Err(QuayError::LocationInactive(location_id.clone()));
        }
        if location.occupied {
            return Err(QuayError::AlreadyOccupied(location_id.clone()));
        }

        location.occupied = true;
        location.occupant = Some(cargo_id.clone());
        self.store.save_location(&location)?;

        tracing::debug!(location = %location_id, cargo = %cargo_id, "slot allocated");
        Ok(())
    }

    /// Occupancy clear without taking the location lock; same caller
    /// contract as [`Self::allocate_locked`].
    pub(crate) fn release_locked(&self, location_id: &LocationId) -> QuayResult<()> {
        let mut location = self
            .store
            .location(location_id)?
            .ok_or_else(|| QuayError::not_found("location", location_id))?;

        if !location.occupied && !self.config.allow_release_of_unrelated {
            return Err(QuayError::NotOccupied(location_id.clone()));
        }

        location.occupied = false;
        location.occupant = None;
        self.store.save_location(&location)?;

        tracing::debug!(location = %location_id, "slot released");
        Ok(())
    }
}
