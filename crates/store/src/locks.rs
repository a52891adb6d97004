//! Per-location mutual exclusion.
//!
//! "Check occupancy, then set occupancy" is not atomic on its own; every
//! mutation of a [`YardLocation`](quay_core::types::YardLocation) must run
//! under the guard returned here. Contention fails fast with
//! [`QuayError::Locked`] instead of blocking -- callers decide whether to
//! retry.

use quay_core::error::{QuayError, QuayResult};
use quay_core::types::LocationId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one lock per location id. Locks are created on first use and
/// kept for the registry's lifetime; the set is bounded by the yard layout.
#[derive(Default)]
pub struct LockRegistry {
    locks: StdMutex<HashMap<LocationId, Arc<Mutex<()>>>>,
}

/// Exclusive hold on one location. Dropping the guard releases the lock.
#[derive(Debug)]
pub struct LocationGuard {
    id: LocationId,
    _guard: OwnedMutexGuard<()>,
}

impl LocationGuard {
    pub fn id(&self) -> &LocationId {
        &self.id
    }
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `id`, or fails fast with [`QuayError::Locked`]
    /// when another operation already holds it.
    pub fn acquire(&self, id: &LocationId) -> QuayResult<LocationGuard> {
        let slot = {
            let mut map = self
                .locks
                .lock()
                .map_err(|_| QuayError::Store("lock registry poisoned".into()))?;
            map.entry(id.clone()).or_default().clone()
        };

        match slot.try_lock_owned() {
            Ok(guard) => Ok(LocationGuard {
                id: id.clone(),
                _guard: guard,
            }),
            Err(_) => {
                tracing::debug!(location = %id, "lock contention");
                Err(QuayError::Locked(id.clone()))
            }
        }
    }

    /// Acquires guards for two distinct locations in sorted id order, so
    /// concurrent movements over the same pair cannot deadlock. Returned in
    /// argument order.
    pub fn acquire_pair(
        &self,
        a: &LocationId,
        b: &LocationId,
    ) -> QuayResult<(LocationGuard, LocationGuard)> {
        debug_assert_ne!(a, b, "acquire_pair requires distinct locations");
        if a <= b {
            let ga = self.acquire(a)?;
            let gb = self.acquire(b)?;
            Ok((ga, gb))
        } else {
            let gb = self.acquire(b)?;
            let ga = self.acquire(a)?;
            Ok((ga, gb))
        }
    }
}
