//! Repository abstraction for the quay terminal engine.
//!
//! The engine components never touch storage directly; they go through the
//! per-entity traits below so the allocation and rollback semantics can be
//! exercised against [`MemoryStore`] in tests and swapped for a database
//! backend without changing the engine.

pub mod locks;
pub mod memory;

use chrono::{DateTime, Utc};
use quay_core::types::{
    AccessPermit, Appointment, CargoId, CargoItem, DigitalPass, EntryId, LocationId, PassId,
    PermitId, PermitType, QueueEntry, QueueZone, TruckId, YardLocation,
};
use quay_core::QuayResult;

pub use locks::{LocationGuard, LockRegistry};
pub use memory::MemoryStore;

/// Yard location state. `save` is an upsert; `occupied` must only be
/// flipped while holding the location's [`LockRegistry`] guard.
pub trait LocationStore: Send + Sync {
    fn location(&self, id: &LocationId) -> QuayResult<Option<YardLocation>>;
    fn save_location(&self, location: &YardLocation) -> QuayResult<()>;
}

/// Cargo item state. The movement tracker owns the `status`/`location_ref`
/// pair; everything else treats cargo as read-only.
pub trait CargoStore: Send + Sync {
    fn cargo(&self, id: &CargoId) -> QuayResult<Option<CargoItem>>;
    fn save_cargo(&self, cargo: &CargoItem) -> QuayResult<()>;
}

/// Digital passes are read-mostly inputs; issuance and revocation happen in
/// an upstream workflow, so the engine gets no write access.
pub trait PassStore: Send + Sync {
    fn pass(&self, id: &PassId) -> QuayResult<Option<DigitalPass>>;
}

/// Access permits. The validator only reads; the post-gate consumption step
/// performs the single `Pending -> Used` write.
pub trait PermitStore: Send + Sync {
    fn permit(&self, id: &PermitId) -> QuayResult<Option<AccessPermit>>;

    /// The pending permit of the given type for a pass, if one exists.
    fn pending_permit(
        &self,
        pass: &PassId,
        permit_type: PermitType,
    ) -> QuayResult<Option<AccessPermit>>;

    fn save_permit(&self, permit: &AccessPermit) -> QuayResult<()>;
}

/// Waiting-queue entries across all zones.
pub trait QueueStore: Send + Sync {
    fn entry(&self, id: &EntryId) -> QuayResult<Option<QueueEntry>>;
    fn save_entry(&self, entry: &QueueEntry) -> QuayResult<()>;

    /// A truck's WAITING entry in any zone. Uniqueness is scoped across
    /// zones, so at most one can exist.
    fn waiting_entry_for_truck(&self, truck: &TruckId) -> QuayResult<Option<QueueEntry>>;

    /// WAITING entries of one zone, oldest first.
    fn waiting_in_zone(&self, zone: QueueZone) -> QuayResult<Vec<QueueEntry>>;
}

/// Scheduled gate visits, consulted by the admission validator.
pub trait AppointmentStore: Send + Sync {
    /// The earliest appointment for a pass scheduled at or after `from`.
    fn next_appointment_for_pass(
        &self,
        pass: &PassId,
        from: DateTime<Utc>,
    ) -> QuayResult<Option<Appointment>>;
}
