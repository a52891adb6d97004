//! Cargo movement orchestration.
//!
//! A movement frees the origin slot and claims the destination slot as one
//! atomic unit: both location guards are held for the whole sequence, and a
//! destination failure after the origin was already released restores the
//! origin before the error surfaces. Cargo must never be left in limbo.

use crate::allocator::SlotAllocator;
use crate::audit::{AuditRecord, AuditRecorder};
use crate::clock::Clock;
use chrono::{DateTime, Utc};
use quay_core::error::{QuayError, QuayResult};
use quay_core::types::{
    CargoId, CargoStatus, LocationId, MovementType, SealCondition, VerificationType,
};
use quay_store::{CargoStore, LocationGuard, LocationStore, LockRegistry};
use serde_json::{json, Value};
use std::sync::Arc;

/// One requested location change.
#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub cargo_id: CargoId,
    pub destination_id: LocationId,
    /// When supplied, must match the cargo item's current location;
    /// when omitted, the current location is used.
    pub origin_id: Option<LocationId>,
    pub movement_type: MovementType,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub actor: String,
}

pub struct MovementTracker<S> {
    store: Arc<S>,
    allocator: SlotAllocator<S>,
    locks: Arc<LockRegistry>,
    recorder: Arc<dyn AuditRecorder>,
    clock: Arc<dyn Clock>,
}

impl<S: LocationStore + CargoStore> MovementTracker<S> {
    pub fn new(
        store: Arc<S>,
        allocator: SlotAllocator<S>,
        locks: Arc<LockRegistry>,
        recorder: Arc<dyn AuditRecorder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            allocator,
            locks,
            recorder,
            clock,
        }
    }

    /// Moves a cargo item to `destination_id` and returns its new status.
    ///
    /// `Dispatch` records the destination for traceability but leaves it
    /// unoccupied -- the cargo is leaving the yard. Every other movement
    /// type claims the destination slot and stores the item.
    pub fn move_cargo(&self, req: MovementRequest) -> QuayResult<CargoStatus> {
        let mut cargo = self
            .store
            .cargo(&req.cargo_id)?
            .ok_or_else(|| QuayError::not_found("cargo", &req.cargo_id))?;

        if !cargo.in_yard() {
            return Err(QuayError::CargoNotMovable(req.cargo_id.clone()));
        }

        let origin = match &req.origin_id {
            Some(supplied) => {
                if cargo.location_ref.as_ref() != Some(supplied) {
                    return Err(QuayError::OriginMismatch {
                        supplied: supplied.clone(),
                        actual: cargo.location_ref.clone(),
                    });
                }
                Some(supplied.clone())
            }
            None => cargo.location_ref.clone(),
        };

        // Hold both guards for the whole move. acquire_pair locks in id
        // order, so two concurrent moves over the same pair cannot deadlock.
        let (_origin_guard, _dest_guard): (Option<LocationGuard>, LocationGuard) = match &origin {
            Some(o) if *o != req.destination_id => {
                let (og, dg) = self.locks.acquire_pair(o, &req.destination_id)?;
                (Some(og), dg)
            }
            _ => (None, self.locks.acquire(&req.destination_id)?),
        };

        let destination = self
            .store
            .location(&req.destination_id)?
            .ok_or_else(|| QuayError::not_found("location", &req.destination_id))?;

        // Dispatch bypasses destination exclusivity: the slot is only
        // recorded, never claimed.
        if req.movement_type != MovementType::Dispatch && destination.occupied {
            return Err(QuayError::DestinationOccupied(req.destination_id.clone()));
        }

        let before = cargo.clone();

        // Free the origin. Best-effort: a vanished origin location is
        // logged, not fatal.
        if let Some(origin_id) = &origin {
            match self.allocator.release_locked(origin_id) {
                Ok(()) => {}
                Err(QuayError::NotFound { .. }) => {
                    tracing::warn!(origin = %origin_id, cargo = %req.cargo_id, "origin location missing, skipping release");
                }
                Err(err) => return Err(err),
            }
        }

        if req.movement_type != MovementType::Dispatch {
            if let Err(err) = self
                .allocator
                .allocate_locked(&req.destination_id, &req.cargo_id)
            {
                self.restore_origin(origin.as_ref(), &req.cargo_id);
                return Err(err);
            }
        }

        cargo.status = match req.movement_type {
            MovementType::Dispatch => CargoStatus::Dispatched,
            MovementType::Traction | MovementType::Transfer => CargoStatus::Stored,
        };
        cargo.location_ref = Some(req.destination_id.clone());

        if let Err(err) = self.store.save_cargo(&cargo) {
            if req.movement_type != MovementType::Dispatch {
                if let Err(undo) = self.allocator.release_locked(&req.destination_id) {
                    tracing::error!(destination = %req.destination_id, error = %undo, "failed to undo destination allocation");
                }
            }
            self.restore_origin(origin.as_ref(), &req.cargo_id);
            return Err(err);
        }

        self.recorder.record(
            AuditRecord::new(
                "CARGO_MOVED",
                "cargo",
                &req.cargo_id,
                to_image(&before),
                to_image(&cargo),
                &req.actor,
                self.clock.now(),
            )
            .with_detail(json!({
                "movement_type": req.movement_type,
                "date": req.date,
                "notes": req.notes,
                "origin": origin,
                "destination": req.destination_id,
            })),
        );

        tracing::info!(
            cargo = %req.cargo_id,
            from = ?origin,
            to = %req.destination_id,
            movement = ?req.movement_type,
            status = %cargo.status,
            "cargo moved"
        );

        Ok(cargo.status)
    }

    /// Re-claims the origin slot after a failed move. The guards are still
    /// held, so the slot cannot have been taken in between.
    fn restore_origin(&self, origin: Option<&LocationId>, cargo_id: &CargoId) {
        if let Some(origin_id) = origin {
            if let Err(err) = self.allocator.allocate_locked(origin_id, cargo_id) {
                tracing::error!(origin = %origin_id, cargo = %cargo_id, error = %err, "failed to restore origin after aborted move");
            }
        }
    }

    /// Checks a cargo seal and records the outcome.
    ///
    /// Only a `Replaced` seal mutates the item (the new seal number is
    /// written); every verification is audited. No allocator interaction.
    pub fn verify_seal(
        &self,
        cargo_id: &CargoId,
        seal_number: &str,
        condition: SealCondition,
        verification_type: VerificationType,
        actor: &str,
    ) -> QuayResult<()> {
        let mut cargo = self
            .store
            .cargo(cargo_id)?
            .ok_or_else(|| QuayError::not_found("cargo", cargo_id))?;

        let before = cargo.clone();

        if condition == SealCondition::Replaced {
            cargo.seal_number = Some(seal_number.to_string());
            self.store.save_cargo(&cargo)?;
        }

        self.recorder.record(
            AuditRecord::new(
                "SEAL_VERIFIED",
                "cargo",
                cargo_id,
                to_image(&before),
                to_image(&cargo),
                actor,
                self.clock.now(),
            )
            .with_detail(json!({
                "seal_number": seal_number,
                "condition": condition,
                "verification_type": verification_type,
            })),
        );

        tracing::info!(
            cargo = %cargo_id,
            condition = ?condition,
            verification = ?verification_type,
            "seal verified"
        );

        Ok(())
    }
}

fn to_image<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
