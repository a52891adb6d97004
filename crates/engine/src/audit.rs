//! Audit trail recording.
//!
//! Every mutating engine operation deposits one [`AuditRecord`] describing
//! the state change. Recording is fire-and-forget: a full buffer or a dead
//! sink is logged and dropped, never surfaced to the caller -- audit-store
//! health must not roll back a state change that already happened.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One state change: action kind, affected entity, before/after images,
/// actor, and the instant it was recorded.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub before: Value,
    pub after: Value,
    /// Operation metadata that is not part of the entity image
    /// (movement type, seal condition, ...). `Null` when there is none.
    pub detail: Value,
    pub actor: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        action: &str,
        entity_type: &str,
        entity_id: impl ToString,
        before: Value,
        after: Value,
        actor: &str,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            before,
            after,
            detail: Value::Null,
            actor: actor.to_string(),
            recorded_at,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

/// Collaborator interface the engine records through. Infallible by
/// contract; implementations absorb their own failures.
pub trait AuditRecorder: Send + Sync {
    fn record(&self, record: AuditRecord);
}

// ---------------------------------------------------------------------------
// Recorders
// ---------------------------------------------------------------------------

/// Bounded-channel recorder. `record` never blocks; when the buffer is
/// full the record is dropped with a warning.
pub struct ChannelRecorder {
    tx: mpsc::Sender<AuditRecord>,
}

impl ChannelRecorder {
    /// Creates the recorder plus the receiver to hand to
    /// [`sink::spawn_drain`](crate::sink::spawn_drain).
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<AuditRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl AuditRecorder for ChannelRecorder {
    fn record(&self, record: AuditRecord) {
        if let Err(err) = self.tx.try_send(record) {
            tracing::warn!(error = %err, "audit record dropped");
        }
    }
}

/// Collects records in memory. Test double.
#[derive(Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditRecorder for MemoryRecorder {
    fn record(&self, record: AuditRecord) {
        self.records.lock().unwrap().push(record);
    }
}

/// Discards everything.
pub struct NoopRecorder;

impl AuditRecorder for NoopRecorder {
    fn record(&self, _record: AuditRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32) -> AuditRecord {
        AuditRecord::new(
            "TEST",
            "cargo",
            format!("C-{n}"),
            Value::Null,
            Value::Null,
            "tester",
            Utc::now(),
        )
    }

    #[test]
    fn memory_recorder_accumulates() {
        let recorder = MemoryRecorder::new();
        recorder.record(record(1));
        recorder.record(record(2));
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.records()[0].entity_id, "C-1");
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let (recorder, mut rx) = ChannelRecorder::bounded(1);
        recorder.record(record(1));
        recorder.record(record(2)); // buffer full, dropped

        let first = rx.recv().await.unwrap();
        assert_eq!(first.entity_id, "C-1");
        assert!(rx.try_recv().is_err());
    }
}
