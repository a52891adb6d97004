//! Domain types for the quay terminal engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// String-keyed id newtype. Externally-keyed entities (locations, cargo,
/// passes, permits, trucks, appointments) carry the upstream system's key.
macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Yard storage position key, e.g. `"Z1-B04-R02-T1"`.
    LocationId
);
string_id!(CargoId);
string_id!(PassId);
string_id!(PermitId);
string_id!(TruckId);
string_id!(AppointmentId);

/// Queue entry identity. Minted by the engine on arrival, not by upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Yard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Container,
    General,
    Bulk,
    Reefer,
}

/// A discrete storage position in the terminal yard.
///
/// Invariant: `occupied == true` iff exactly one non-dispatched [`CargoItem`]
/// references this location; `occupant` records which. Only the slot
/// allocator flips `occupied`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YardLocation {
    pub id: LocationId,
    pub zone: String,
    pub block: String,
    pub row: String,
    pub tier: String,
    pub location_type: LocationType,
    pub capacity_teu: u32,
    pub occupied: bool,
    pub occupant: Option<CargoId>,
    pub active: bool,
}

impl YardLocation {
    /// Human-readable position code, `zone-block-row-tier`.
    pub fn code(&self) -> String {
        format!("{}-{}-{}-{}", self.zone, self.block, self.row, self.tier)
    }
}

// ---------------------------------------------------------------------------
// Cargo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CargoStatus {
    InTransit,
    Stored,
    /// Terminal state. The cargo item has left the yard.
    Dispatched,
}

impl std::fmt::Display for CargoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InTransit => f.write_str("IN_TRANSIT"),
            Self::Stored => f.write_str("STORED"),
            Self::Dispatched => f.write_str("DISPATCHED"),
        }
    }
}

/// A tracked unit of cargo (container, bulk lot, general piece).
///
/// `location_ref` points at a live yard slot while the item is
/// `InTransit`/`Stored`; after dispatch it keeps the last destination for
/// traceability even though that slot is no longer occupied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoItem {
    pub id: CargoId,
    pub manifest_ref: String,
    pub bill_of_lading: Option<String>,
    pub status: CargoStatus,
    pub location_ref: Option<LocationId>,
    pub seal_number: Option<String>,
}

impl CargoItem {
    /// True while the item still holds (or may hold) a yard slot.
    pub fn in_yard(&self) -> bool {
        !matches!(self.status, CargoStatus::Dispatched)
    }
}

/// How a cargo item changes location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// In-yard shuffle.
    Traction,
    /// Zone change.
    Transfer,
    /// Exit from the yard. Destination is recorded but never occupied.
    Dispatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SealCondition {
    Intact,
    Damaged,
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationType {
    GateIn,
    GateOut,
    Yard,
}

// ---------------------------------------------------------------------------
// Gate credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassType {
    Personal,
    Vehicular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassStatus {
    Active,
    Expired,
    Revoked,
}

/// A gate credential with a validity window.
///
/// `status == Active` does not by itself imply temporal validity; admission
/// additionally requires `valid_from <= now <= valid_until`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalPass {
    pub id: PassId,
    pub pass_code: String,
    pub pass_type: PassType,
    pub holder: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub status: PassStatus,
}

impl DigitalPass {
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitType {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitStatus {
    Pending,
    /// Terminal. A permit is consumed at most once.
    Used,
    Expired,
}

/// A single-use entry/exit authorization tied to a pass and optionally to a
/// specific cargo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPermit {
    pub id: PermitId,
    pub permit_type: PermitType,
    pub pass_ref: PassId,
    pub cargo_ref: Option<CargoId>,
    pub status: PermitStatus,
}

/// Direction of a gate event being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateAction {
    Entry,
    Exit,
}

// ---------------------------------------------------------------------------
// Pre-gate queue
// ---------------------------------------------------------------------------

/// Holding areas staged before gate admission. Independent queues sharing
/// one state machine; truck uniqueness is enforced across zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueZone {
    Pregate,
    Zoe,
}

impl std::fmt::Display for QueueZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pregate => f.write_str("PREGATE"),
            Self::Zoe => f.write_str("ZOE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    Waiting,
    Authorized,
    Rejected,
}

/// One vehicle's stay in a waiting zone.
///
/// `Waiting -> Authorized` and `Waiting -> Rejected` are the only legal
/// transitions; both are terminal and stamp `exit_time` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub truck_ref: TruckId,
    pub appointment_ref: Option<AppointmentId>,
    pub zone: QueueZone,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub status: QueueStatus,
}

impl QueueEntry {
    pub fn is_waiting(&self) -> bool {
        matches!(self.status, QueueStatus::Waiting)
    }
}

/// A scheduled gate visit. Consulted by the admission validator's
/// near-term-appointment rule; never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub pass_ref: PassId,
    pub truck_ref: TruckId,
    pub scheduled_at: DateTime<Utc>,
}
