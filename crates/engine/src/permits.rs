//! Permit consumption.
//!
//! The validator leaves permits untouched; once the physical gate event is
//! confirmed, this is the explicit `Pending -> Used` step. One-directional
//! and single-shot.

use crate::audit::{AuditRecord, AuditRecorder};
use crate::clock::Clock;
use quay_core::error::{QuayError, QuayResult};
use quay_core::types::{AccessPermit, PermitId, PermitStatus};
use quay_store::PermitStore;
use serde_json::Value;
use std::sync::Arc;

pub struct PermitConsumer<S> {
    store: Arc<S>,
    recorder: Arc<dyn AuditRecorder>,
    clock: Arc<dyn Clock>,
}

impl<S: PermitStore> PermitConsumer<S> {
    pub fn new(store: Arc<S>, recorder: Arc<dyn AuditRecorder>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            recorder,
            clock,
        }
    }

    /// Marks a pending permit as used and returns the updated permit.
    pub fn consume(&self, permit_id: &PermitId, actor: &str) -> QuayResult<AccessPermit> {
        let mut permit = self
            .store
            .permit(permit_id)?
            .ok_or_else(|| QuayError::not_found("permit", permit_id))?;

        if permit.status != PermitStatus::Pending {
            return Err(QuayError::PermitNotPending(permit_id.clone()));
        }

        let before = serde_json::to_value(&permit).unwrap_or(Value::Null);
        permit.status = PermitStatus::Used;
        self.store.save_permit(&permit)?;

        self.recorder.record(AuditRecord::new(
            "PERMIT_CONSUMED",
            "permit",
            permit_id,
            before,
            serde_json::to_value(&permit).unwrap_or(Value::Null),
            actor,
            self.clock.now(),
        ));

        tracing::info!(permit = %permit_id, "permit consumed");
        Ok(permit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryRecorder;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use quay_core::types::{PassId, PermitType};
    use quay_store::MemoryStore;

    fn consumer(store: Arc<MemoryStore>) -> (Arc<MemoryRecorder>, PermitConsumer<MemoryStore>) {
        let recorder = Arc::new(MemoryRecorder::new());
        let clock = Arc::new(ManualClock::at(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ));
        (recorder.clone(), PermitConsumer::new(store, recorder, clock))
    }

    fn pending_permit(id: &str) -> AccessPermit {
        AccessPermit {
            id: PermitId::from(id),
            permit_type: PermitType::Exit,
            pass_ref: PassId::from("P1"),
            cargo_ref: None,
            status: PermitStatus::Pending,
        }
    }

    #[test]
    fn consumption_is_single_shot() {
        let store = Arc::new(MemoryStore::new());
        store.insert_permit(pending_permit("PRM-1")).unwrap();
        let (recorder, consumer) = consumer(store.clone());

        let used = consumer.consume(&PermitId::from("PRM-1"), "gate").unwrap();
        assert_eq!(used.status, PermitStatus::Used);
        assert_eq!(recorder.len(), 1);

        match consumer.consume(&PermitId::from("PRM-1"), "gate") {
            Err(QuayError::PermitNotPending(_)) => {}
            other => panic!("expected PermitNotPending, got {other:?}"),
        }
        // The failed retry records nothing.
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn unknown_permit_is_not_found() {
        let (_, consumer) = consumer(Arc::new(MemoryStore::new()));
        match consumer.consume(&PermitId::from("ghost"), "gate") {
            Err(QuayError::NotFound { entity, .. }) => assert_eq!(entity, "permit"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
