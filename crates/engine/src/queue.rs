//! Pre-gate waiting queue (Antepuerto / ZOE).
//!
//! Zones are independent FIFO lines sharing one state machine and one
//! uniqueness constraint: a truck can be WAITING in at most one zone at a
//! time. Statistics are read-only snapshots computed on demand.

use crate::audit::{AuditRecord, AuditRecorder};
use crate::clock::Clock;
use quay_core::error::{QuayError, QuayResult};
use quay_core::types::{
    AppointmentId, EntryId, QueueEntry, QueueStatus, QueueZone, TruckId,
};
use quay_store::QueueStore;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Wait-time summary over one zone's WAITING entries.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatistics {
    pub zone: QueueZone,
    pub count: usize,
    pub avg_wait_minutes: f64,
    pub max_wait_minutes: i64,
}

pub struct GateQueue<S> {
    store: Arc<S>,
    recorder: Arc<dyn AuditRecorder>,
    clock: Arc<dyn Clock>,
}

impl<S: QueueStore> GateQueue<S> {
    pub fn new(store: Arc<S>, recorder: Arc<dyn AuditRecorder>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            recorder,
            clock,
        }
    }

    /// Admits a truck into a waiting zone.
    ///
    /// Rejected with [`QuayError::AlreadyQueued`] when the truck is
    /// WAITING anywhere -- the uniqueness constraint spans zones.
    pub fn enqueue(
        &self,
        truck_id: &TruckId,
        appointment_id: Option<AppointmentId>,
        zone: QueueZone,
        actor: &str,
    ) -> QuayResult<EntryId> {
        if let Some(existing) = self.store.waiting_entry_for_truck(truck_id)? {
            tracing::debug!(truck = %truck_id, zone = %existing.zone, "truck already queued");
            return Err(QuayError::AlreadyQueued(truck_id.clone()));
        }

        let entry = QueueEntry {
            id: EntryId::new(),
            truck_ref: truck_id.clone(),
            appointment_ref: appointment_id,
            zone,
            entry_time: self.clock.now(),
            exit_time: None,
            status: QueueStatus::Waiting,
        };
        self.store.save_entry(&entry)?;

        self.recorder.record(AuditRecord::new(
            "QUEUE_ENTERED",
            "queue_entry",
            entry.id,
            Value::Null,
            serde_json::to_value(&entry).unwrap_or(Value::Null),
            actor,
            self.clock.now(),
        ));

        tracing::info!(truck = %truck_id, zone = %zone, entry = %entry.id, "truck enqueued");
        Ok(entry.id)
    }

    /// `WAITING -> AUTHORIZED`, stamping the exit time.
    pub fn authorize(&self, entry_id: &EntryId, actor: &str) -> QuayResult<()> {
        self.close(entry_id, QueueStatus::Authorized, "QUEUE_AUTHORIZED", actor)
    }

    /// `WAITING -> REJECTED`, stamping the exit time.
    pub fn reject(&self, entry_id: &EntryId, actor: &str) -> QuayResult<()> {
        self.close(entry_id, QueueStatus::Rejected, "QUEUE_REJECTED", actor)
    }

    fn close(
        &self,
        entry_id: &EntryId,
        terminal: QueueStatus,
        action: &str,
        actor: &str,
    ) -> QuayResult<()> {
        let mut entry = self
            .store
            .entry(entry_id)?
            .ok_or_else(|| QuayError::not_found("queue entry", entry_id))?;

        if !entry.is_waiting() {
            return Err(QuayError::NotWaiting(*entry_id));
        }

        let before = serde_json::to_value(&entry).unwrap_or(Value::Null);
        entry.status = terminal;
        entry.exit_time = Some(self.clock.now());
        self.store.save_entry(&entry)?;

        self.recorder.record(AuditRecord::new(
            action,
            "queue_entry",
            entry_id,
            before,
            serde_json::to_value(&entry).unwrap_or(Value::Null),
            actor,
            self.clock.now(),
        ));

        tracing::info!(entry = %entry_id, status = ?terminal, "queue entry closed");
        Ok(())
    }

    /// Minutes between entry and exit; live entries measure against now.
    pub fn waiting_time_minutes(&self, entry: &QueueEntry) -> i64 {
        let end = entry.exit_time.unwrap_or_else(|| self.clock.now());
        (end - entry.entry_time).num_minutes()
    }

    /// Snapshot statistics over one zone's WAITING entries.
    pub fn statistics(&self, zone: QueueZone) -> QuayResult<QueueStatistics> {
        let waiting = self.store.waiting_in_zone(zone)?;
        let waits: Vec<i64> = waiting
            .iter()
            .map(|e| self.waiting_time_minutes(e))
            .collect();

        let count = waits.len();
        let avg_wait_minutes = if count == 0 {
            0.0
        } else {
            waits.iter().sum::<i64>() as f64 / count as f64
        };
        let max_wait_minutes = waits.iter().copied().max().unwrap_or(0);

        Ok(QueueStatistics {
            zone,
            count,
            avg_wait_minutes,
            max_wait_minutes,
        })
    }
}
