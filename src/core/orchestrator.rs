//! Cross-module workflows
//!
//! [`CareOrchestrator`] is the one place where a change in one module drives a
//! write in another:
//!
//! - an inpatient `EncounterCreated` event opens a pending discharge,
//! - completing a discharge finishes its encounter in the same transaction.

use crate::adapters::memory::{Database, Transaction};
use crate::core::events::DomainEvent;
use crate::domain::{DischargeId, PractitionerId, RequestContext, Result};
use crate::modules::admission::{AdmissionService, EncounterClass, EncounterSummary};
use crate::modules::discharge::{DischargeService, DischargeSummary};
use std::sync::Arc;
use tracing::Instrument;

/// A completed discharge with its finished encounter
#[derive(Debug, Clone)]
pub struct CompletedDischarge {
    pub discharge: DischargeSummary,
    pub encounter: EncounterSummary,
}

pub struct CareOrchestrator {
    db: Database,
    admission: Arc<AdmissionService>,
    discharge: Arc<DischargeService>,
}

impl CareOrchestrator {
    pub fn new(
        db: Database,
        admission: Arc<AdmissionService>,
        discharge: Arc<DischargeService>,
    ) -> Self {
        Self {
            db,
            admission,
            discharge,
        }
    }

    /// Delivers committed events, one transaction per event
    ///
    /// Stops at the first failing event; events already handled stay committed.
    pub async fn dispatch(&self, ctx: &RequestContext, events: &[DomainEvent]) -> Result<()> {
        for event in events {
            async {
                let mut tx = self.db.begin().await;
                self.handle(ctx, &mut tx, event).await?;
                tx.commit();
                Ok::<_, crate::domain::HospitalError>(())
            }
            .instrument(ctx.span(event.name()))
            .await?;
        }
        Ok(())
    }

    /// Applies one event's consequences inside `tx`
    pub async fn handle(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        event: &DomainEvent,
    ) -> Result<()> {
        match event {
            DomainEvent::EncounterCreated {
                encounter_id,
                class: EncounterClass::Inpatient,
                ..
            } => {
                self.discharge.open_pending(ctx, tx, *encounter_id).await?;
            }
            DomainEvent::EncounterCreated { encounter_id, class, .. } => {
                tracing::trace!(
                    encounter_id = %encounter_id,
                    class = %class,
                    "No discharge tracking for encounter class"
                );
            }
        }
        Ok(())
    }

    /// Finalizes a discharge and finishes its encounter inside `tx`
    ///
    /// Either both changes are staged or, on error, the caller's transaction
    /// must be dropped.
    pub async fn complete_discharge(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        discharge_id: DischargeId,
        finalized_by: PractitionerId,
    ) -> Result<CompletedDischarge> {
        let discharge = self
            .discharge
            .finalize(ctx, tx, discharge_id, finalized_by)
            .await?;
        let encounter = self
            .admission
            .finish_after_discharge(ctx, tx, discharge.encounter_id)
            .await?;
        Ok(CompletedDischarge {
            discharge,
            encounter,
        })
    }
}
