//! Domain models, shared types, and error definitions.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod error;
pub mod types;

pub use error::{QuayError, QuayResult};
pub use types::{
    AccessPermit, Appointment, AppointmentId, CargoId, CargoItem, CargoStatus, DigitalPass,
    EntryId, GateAction, LocationId, LocationType, MovementType, PassId, PassStatus, PassType,
    PermitId, PermitStatus, PermitType, QueueEntry, QueueStatus, QueueZone, SealCondition,
    TruckId, VerificationType, YardLocation,
};
