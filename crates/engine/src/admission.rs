//! Gate admission rule engine.
//!
//! Every rule is evaluated -- partial results accumulate into the decision
//! instead of short-circuiting, so one validation round surfaces every
//! violation at once. The validator reads pass, permit, cargo, and
//! appointment state and never writes any of it.

use crate::clock::Clock;
use chrono::Duration;
use quay_core::error::{QuayError, QuayResult};
use quay_core::types::{CargoId, CargoStatus, GateAction, PassId, PassStatus, PassType, PermitType};
use quay_store::{AppointmentStore, CargoStore, PassStore, PermitStore};
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

/// A broken admission rule. Any single violation denies admission.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "rule", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleViolation {
    #[error("pass is not active (status {status:?})")]
    PassNotActive { status: PassStatus },

    #[error("pass is not yet valid")]
    PassNotYetValid,

    #[error("pass has expired")]
    PassExpired,

    #[error("no pending entry permit for this pass")]
    MissingEntryPermit,

    #[error("no pending exit permit for this pass")]
    MissingExitPermit,

    #[error("cargo {cargo} not found")]
    CargoUnknown { cargo: CargoId },

    #[error("cargo is missing a bill of lading")]
    MissingBillOfLading,

    #[error("cargo status {status} does not allow gate exit")]
    CargoNotExitable { status: CargoStatus },
}

/// A tolerated irregularity, flagged but not denying admission.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "rule", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleWarning {
    #[error("exit permit is linked to cargo {permit_cargo}, not {cargo}")]
    PermitCargoMismatch {
        permit_cargo: CargoId,
        cargo: CargoId,
    },

    #[error("no appointment scheduled within the next {window_minutes} minutes")]
    NoUpcomingAppointment { window_minutes: i64 },
}

/// Accumulated outcome of one gate event's rule chain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Decision {
    pub violations: SmallVec<[RuleViolation; 4]>,
    pub warnings: SmallVec<[RuleWarning; 2]>,
}

impl Decision {
    pub fn valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violation messages, for callers that surface plain text.
    pub fn errors(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

/// Tunables for the admission rule chain.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionConfig {
    /// How far ahead an appointment may be scheduled and still count as
    /// "near-term" for the vehicular-entry rule.
    pub appointment_window: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            appointment_window: Duration::hours(2),
        }
    }
}

pub struct AdmissionValidator<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: AdmissionConfig,
}

impl<S> AdmissionValidator<S>
where
    S: PassStore + PermitStore + CargoStore + AppointmentStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(store, clock, AdmissionConfig::default())
    }

    pub fn with_config(store: Arc<S>, clock: Arc<dyn Clock>, config: AdmissionConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Runs the full rule chain for one gate event.
    ///
    /// Only an unknown pass fails the call itself; rule outcomes -- however
    /// bad -- come back inside the [`Decision`].
    pub fn validate(
        &self,
        pass_id: &PassId,
        action: GateAction,
        cargo_id: Option<&CargoId>,
    ) -> QuayResult<Decision> {
        let pass = self
            .store
            .pass(pass_id)?
            .ok_or_else(|| QuayError::not_found("pass", pass_id))?;

        let now = self.clock.now();
        let mut decision = Decision::default();

        if pass.status != PassStatus::Active {
            decision
                .violations
                .push(RuleViolation::PassNotActive { status: pass.status });
        }

        if now < pass.valid_from {
            decision.violations.push(RuleViolation::PassNotYetValid);
        } else if now > pass.valid_until {
            decision.violations.push(RuleViolation::PassExpired);
        }

        match action {
            GateAction::Exit => {
                let permit = self.store.pending_permit(pass_id, PermitType::Exit)?;
                if permit.is_none() {
                    decision.violations.push(RuleViolation::MissingExitPermit);
                }

                if let Some(cargo_id) = cargo_id {
                    match self.store.cargo(cargo_id)? {
                        None => decision.violations.push(RuleViolation::CargoUnknown {
                            cargo: cargo_id.clone(),
                        }),
                        Some(cargo) => {
                            let bl_missing = cargo
                                .bill_of_lading
                                .as_deref()
                                .map_or(true, |bl| bl.trim().is_empty());
                            if bl_missing {
                                decision.violations.push(RuleViolation::MissingBillOfLading);
                            }

                            if !matches!(
                                cargo.status,
                                CargoStatus::InTransit | CargoStatus::Stored
                            ) {
                                decision.violations.push(RuleViolation::CargoNotExitable {
                                    status: cargo.status,
                                });
                            }

                            // A permit pointing at different cargo is
                            // tolerated but flagged; a permit with no cargo
                            // linkage is generic and raises nothing.
                            if let Some(permit) = &permit {
                                if let Some(permit_cargo) = &permit.cargo_ref {
                                    if permit_cargo != cargo_id {
                                        decision.warnings.push(
                                            RuleWarning::PermitCargoMismatch {
                                                permit_cargo: permit_cargo.clone(),
                                                cargo: cargo_id.clone(),
                                            },
                                        );
                                    }
                                }
                            }
                        }
                    }
                }
            }
            GateAction::Entry => {
                if self
                    .store
                    .pending_permit(pass_id, PermitType::Entry)?
                    .is_none()
                {
                    decision.violations.push(RuleViolation::MissingEntryPermit);
                }
            }
        }

        if action == GateAction::Entry && pass.pass_type == PassType::Vehicular {
            let near_term = self
                .store
                .next_appointment_for_pass(pass_id, now)?
                .map_or(false, |a| a.scheduled_at - now <= self.config.appointment_window);
            if !near_term {
                decision.warnings.push(RuleWarning::NoUpcomingAppointment {
                    window_minutes: self.config.appointment_window.num_minutes(),
                });
            }
        }

        tracing::debug!(
            pass = %pass_id,
            action = ?action,
            valid = decision.valid(),
            violations = decision.violations.len(),
            warnings = decision.warnings.len(),
            "admission validated"
        );

        Ok(decision)
    }
}
