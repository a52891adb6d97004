//! In-memory reference store.
//!
//! Backs the CLI simulation, the integration tests, and the benches. Each
//! entity family lives under its own `RwLock` map; consistency across
//! families is the engine's job (via [`LockRegistry`](crate::LockRegistry)),
//! not the store's.

use crate::{
    AppointmentStore, CargoStore, LocationStore, PassStore, PermitStore, QueueStore,
};
use chrono::{DateTime, Utc};
use quay_core::error::{QuayError, QuayResult};
use quay_core::types::{
    AccessPermit, Appointment, AppointmentId, CargoId, CargoItem, DigitalPass, EntryId,
    LocationId, PassId, PermitId, PermitStatus, PermitType, QueueEntry, QueueZone, TruckId,
    YardLocation,
};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    locations: RwLock<HashMap<LocationId, YardLocation>>,
    cargo: RwLock<HashMap<CargoId, CargoItem>>,
    passes: RwLock<HashMap<PassId, DigitalPass>>,
    permits: RwLock<HashMap<PermitId, AccessPermit>>,
    entries: RwLock<HashMap<EntryId, QueueEntry>>,
    appointments: RwLock<HashMap<AppointmentId, Appointment>>,
}

fn poisoned() -> QuayError {
    QuayError::Store("store lock poisoned".into())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- fixture seeding -------------------------------------------------

    pub fn insert_location(&self, location: YardLocation) -> QuayResult<()> {
        self.locations
            .write()
            .map_err(|_| poisoned())?
            .insert(location.id.clone(), location);
        Ok(())
    }

    pub fn insert_cargo(&self, cargo: CargoItem) -> QuayResult<()> {
        self.cargo
            .write()
            .map_err(|_| poisoned())?
            .insert(cargo.id.clone(), cargo);
        Ok(())
    }

    pub fn insert_pass(&self, pass: DigitalPass) -> QuayResult<()> {
        self.passes
            .write()
            .map_err(|_| poisoned())?
            .insert(pass.id.clone(), pass);
        Ok(())
    }

    pub fn insert_permit(&self, permit: AccessPermit) -> QuayResult<()> {
        self.permits
            .write()
            .map_err(|_| poisoned())?
            .insert(permit.id.clone(), permit);
        Ok(())
    }

    pub fn insert_appointment(&self, appointment: Appointment) -> QuayResult<()> {
        self.appointments
            .write()
            .map_err(|_| poisoned())?
            .insert(appointment.id.clone(), appointment);
        Ok(())
    }

    // -- snapshots for reporting -----------------------------------------

    pub fn all_locations(&self) -> QuayResult<Vec<YardLocation>> {
        let mut out: Vec<_> = self
            .locations
            .read()
            .map_err(|_| poisoned())?
            .values()
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    pub fn all_cargo(&self) -> QuayResult<Vec<CargoItem>> {
        let mut out: Vec<_> = self
            .cargo
            .read()
            .map_err(|_| poisoned())?
            .values()
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }
}

impl LocationStore for MemoryStore {
    fn location(&self, id: &LocationId) -> QuayResult<Option<YardLocation>> {
        Ok(self.locations.read().map_err(|_| poisoned())?.get(id).cloned())
    }

    fn save_location(&self, location: &YardLocation) -> QuayResult<()> {
        self.locations
            .write()
            .map_err(|_| poisoned())?
            .insert(location.id.clone(), location.clone());
        Ok(())
    }
}

impl CargoStore for MemoryStore {
    fn cargo(&self, id: &CargoId) -> QuayResult<Option<CargoItem>> {
        Ok(self.cargo.read().map_err(|_| poisoned())?.get(id).cloned())
    }

    fn save_cargo(&self, cargo: &CargoItem) -> QuayResult<()> {
        self.cargo
            .write()
            .map_err(|_| poisoned())?
            .insert(cargo.id.clone(), cargo.clone());
        Ok(())
    }
}

impl PassStore for MemoryStore {
    fn pass(&self, id: &PassId) -> QuayResult<Option<DigitalPass>> {
        Ok(self.passes.read().map_err(|_| poisoned())?.get(id).cloned())
    }
}

impl PermitStore for MemoryStore {
    fn permit(&self, id: &PermitId) -> QuayResult<Option<AccessPermit>> {
        Ok(self.permits.read().map_err(|_| poisoned())?.get(id).cloned())
    }

    fn pending_permit(
        &self,
        pass: &PassId,
        permit_type: PermitType,
    ) -> QuayResult<Option<AccessPermit>> {
        let permits = self.permits.read().map_err(|_| poisoned())?;
        let mut matching: Vec<&AccessPermit> = permits
            .values()
            .filter(|p| {
                p.pass_ref == *pass
                    && p.permit_type == permit_type
                    && p.status == PermitStatus::Pending
            })
            .collect();
        // Deterministic pick when several are pending.
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matching.first().map(|p| (*p).clone()))
    }

    fn save_permit(&self, permit: &AccessPermit) -> QuayResult<()> {
        self.permits
            .write()
            .map_err(|_| poisoned())?
            .insert(permit.id.clone(), permit.clone());
        Ok(())
    }
}

impl QueueStore for MemoryStore {
    fn entry(&self, id: &EntryId) -> QuayResult<Option<QueueEntry>> {
        Ok(self.entries.read().map_err(|_| poisoned())?.get(id).cloned())
    }

    fn save_entry(&self, entry: &QueueEntry) -> QuayResult<()> {
        self.entries
            .write()
            .map_err(|_| poisoned())?
            .insert(entry.id, entry.clone());
        Ok(())
    }

    fn waiting_entry_for_truck(&self, truck: &TruckId) -> QuayResult<Option<QueueEntry>> {
        Ok(self
            .entries
            .read()
            .map_err(|_| poisoned())?
            .values()
            .find(|e| e.truck_ref == *truck && e.is_waiting())
            .cloned())
    }

    fn waiting_in_zone(&self, zone: QueueZone) -> QuayResult<Vec<QueueEntry>> {
        let mut waiting: Vec<QueueEntry> = self
            .entries
            .read()
            .map_err(|_| poisoned())?
            .values()
            .filter(|e| e.zone == zone && e.is_waiting())
            .cloned()
            .collect();
        waiting.sort_by_key(|e| e.entry_time);
        Ok(waiting)
    }
}

impl AppointmentStore for MemoryStore {
    fn next_appointment_for_pass(
        &self,
        pass: &PassId,
        from: DateTime<Utc>,
    ) -> QuayResult<Option<Appointment>> {
        Ok(self
            .appointments
            .read()
            .map_err(|_| poisoned())?
            .values()
            .filter(|a| a.pass_ref == *pass && a.scheduled_at >= from)
            .min_by_key(|a| a.scheduled_at)
            .cloned())
    }
}
