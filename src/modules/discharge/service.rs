//! Write service for discharges

use super::model::{Discharge, DischargeStatus, DischargeSummary, DischargeUpdate};
use super::DischargeTables;
use crate::adapters::memory::Transaction;
use crate::domain::validate::optional_text;
use crate::domain::{
    DischargeId, EncounterId, HospitalError, PatientId, PractitionerId, RequestContext, Result,
};
use crate::modules::admission::AdmissionAccess;
use crate::modules::billing::BillingAccess;
use crate::modules::identity::IdentityAccess;
use std::sync::Arc;

pub struct DischargeService {
    tables: DischargeTables,
    admission: Arc<dyn AdmissionAccess>,
    identity: Arc<dyn IdentityAccess>,
    billing: Arc<dyn BillingAccess>,
    enforce_checklist: bool,
}

impl DischargeService {
    pub(super) fn new(
        tables: DischargeTables,
        admission: Arc<dyn AdmissionAccess>,
        identity: Arc<dyn IdentityAccess>,
        billing: Arc<dyn BillingAccess>,
        enforce_checklist: bool,
    ) -> Self {
        Self {
            tables,
            admission,
            identity,
            billing,
            enforce_checklist,
        }
    }

    /// Opens a `pending` discharge for an encounter
    ///
    /// Returns `None` when the encounter already has a discharge, so delivering
    /// the same event twice creates one record.
    pub async fn open_pending(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        encounter_id: EncounterId,
    ) -> Result<Option<DischargeSummary>> {
        if tx
            .read(&self.tables.discharges)
            .values()
            .any(|d| d.encounter_id == encounter_id)
        {
            tracing::debug!(
                correlation_id = %ctx.correlation_id(),
                encounter_id = %encounter_id,
                "Discharge already open, skipping"
            );
            return Ok(None);
        }

        let encounter = self
            .admission
            .within(tx)
            .get_encounter_summary(encounter_id)
            .await
            .ok_or_else(|| HospitalError::not_found("encounter", "encounter_id", encounter_id))?;

        let discharge = tx
            .write(&self.tables.discharges)
            .create(|id| Discharge {
                id,
                encounter_id,
                patient_id: encounter.patient_id,
                status: DischargeStatus::Pending,
                clinical_summary: None,
                disposition: None,
                finalized_by: None,
                initiated_at: None,
                discharged_at: None,
            })
            .summary(None);

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            discharge_id = %discharge.id,
            encounter_id = %encounter_id,
            "Pending discharge opened"
        );
        Ok(Some(discharge))
    }

    /// Starts the discharge process for an encounter
    ///
    /// Promotes an auto-created `pending` discharge, or creates one, and opens
    /// its checklist.
    ///
    /// # Errors
    ///
    /// - `ReferencedEntityNotFound` for an unknown encounter or patient
    /// - `Validation` when the patient is not the encounter's patient, or the
    ///   encounter has already ended
    /// - `Conflict` when the discharge is already in progress or completed
    pub async fn initiate(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        encounter_id: EncounterId,
        patient_id: PatientId,
    ) -> Result<DischargeSummary> {
        let encounter = self
            .admission
            .within(tx)
            .get_encounter_summary(encounter_id)
            .await
            .ok_or_else(|| HospitalError::not_found("encounter", "encounter_id", encounter_id))?;
        if !self.identity.within(tx).validate_patient_exists(patient_id).await {
            return Err(HospitalError::not_found("patient", "patient_id", patient_id));
        }
        if encounter.patient_id != patient_id {
            return Err(HospitalError::Validation(format!(
                "patient {patient_id} does not match encounter {encounter_id} (patient {})",
                encounter.patient_id
            )));
        }
        if encounter.status.is_terminal() {
            return Err(HospitalError::Validation(format!(
                "encounter {encounter_id} is {}",
                encounter.status
            )));
        }

        let existing = tx
            .read(&self.tables.discharges)
            .values()
            .find(|d| d.encounter_id == encounter_id)
            .map(|d| (d.id, d.status));

        let now = ctx.now();
        let id = match existing {
            Some((_, status @ (DischargeStatus::InProgress | DischargeStatus::Completed))) => {
                return Err(HospitalError::Conflict(format!(
                    "encounter {encounter_id} already has a discharge ({status})"
                )));
            }
            Some((id, DischargeStatus::Pending)) => {
                if let Some(discharge) = tx.write(&self.tables.discharges).get_mut(id) {
                    discharge.status = DischargeStatus::InProgress;
                    discharge.initiated_at = Some(now);
                }
                id
            }
            None => tx.write(&self.tables.discharges).insert_with(|id| Discharge {
                id,
                encounter_id,
                patient_id,
                status: DischargeStatus::InProgress,
                clinical_summary: None,
                disposition: None,
                finalized_by: None,
                initiated_at: Some(now),
                discharged_at: None,
            }),
        };
        tx.write(&self.tables.requirements).entry(id).or_default();

        let discharge = self.summary_in_tx(tx, DischargeId::new(id))?;
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            discharge_id = %discharge.id,
            encounter_id = %encounter_id,
            promoted = existing.is_some(),
            "Discharge initiated"
        );
        Ok(discharge)
    }

    /// Applies summary, disposition and checklist changes
    ///
    /// Writing a non-empty clinical summary also sets `summary_written` unless
    /// the update names that gate explicitly.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: DischargeId,
        changes: DischargeUpdate,
    ) -> Result<DischargeSummary> {
        let current = self.summary_in_tx(tx, id)?;
        if current.status == DischargeStatus::Completed {
            return Err(HospitalError::Conflict(format!(
                "discharge {id} is completed"
            )));
        }

        let clinical_summary = optional_text(changes.clinical_summary);
        let wrote_summary = clinical_summary.is_some();
        if let Some(discharge) = tx.write(&self.tables.discharges).get_mut(id.value()) {
            if clinical_summary.is_some() {
                discharge.clinical_summary = clinical_summary;
            }
            if changes.disposition.is_some() {
                discharge.disposition = changes.disposition;
            }
        }

        let reqs = tx
            .write(&self.tables.requirements)
            .entry(id.value())
            .or_default();
        set_gate(&mut reqs.diagnosis_recorded, changes.diagnosis_recorded);
        set_gate(&mut reqs.signature_obtained, changes.signature_obtained);
        set_gate(&mut reqs.medication_reconciled, changes.medication_reconciled);
        set_gate(
            &mut reqs.summary_written,
            changes.summary_written.or(wrote_summary.then_some(true)),
        );
        set_gate(&mut reqs.follow_up_scheduled, changes.follow_up_scheduled);

        let discharge = self.summary_in_tx(tx, id)?;
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            discharge_id = %id,
            missing = ?discharge.requirements.missing(),
            "Discharge updated"
        );
        Ok(discharge)
    }

    /// Completes a discharge once billing clears the encounter
    ///
    /// # Errors
    ///
    /// - `ReferencedEntityNotFound` for an unknown discharge or practitioner
    /// - `InvalidStateTransition` unless the discharge is `in-progress`
    /// - `FinancialClearanceRequired` while billing reports a balance
    /// - `MissingRequiredField` naming the first unmet gate, when the checklist
    ///   is enforced
    pub async fn finalize(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: DischargeId,
        finalized_by: PractitionerId,
    ) -> Result<DischargeSummary> {
        let current = self.summary_in_tx(tx, id)?;
        if !self.identity.within(tx).validate_practitioner_exists(finalized_by).await {
            return Err(HospitalError::not_found(
                "practitioner",
                "finalized_by",
                finalized_by,
            ));
        }
        if current.status != DischargeStatus::InProgress {
            return Err(HospitalError::transition(
                "discharge",
                current.status,
                DischargeStatus::Completed,
            ));
        }

        let balance = self
            .billing
            .within(tx)
            .get_encounter_balance(current.encounter_id)
            .await;
        if !balance.is_cleared() {
            return Err(HospitalError::FinancialClearanceRequired {
                encounter_id: current.encounter_id.value(),
                outstanding: balance.outstanding,
            });
        }
        if self.enforce_checklist {
            if let Some(gate) = current.requirements.first_missing_clinical() {
                return Err(HospitalError::missing(gate));
            }
        }

        let now = ctx.now();
        if let Some(discharge) = tx.write(&self.tables.discharges).get_mut(id.value()) {
            discharge.status = DischargeStatus::Completed;
            discharge.discharged_at = Some(now);
            discharge.finalized_by = Some(finalized_by);
        }
        tx.write(&self.tables.requirements)
            .entry(id.value())
            .or_default()
            .billing_cleared = true;

        let discharge = self.summary_in_tx(tx, id)?;
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            discharge_id = %id,
            encounter_id = %discharge.encounter_id,
            finalized_by = %finalized_by,
            "Discharge completed"
        );
        Ok(discharge)
    }

    fn summary_in_tx(&self, tx: &Transaction, id: DischargeId) -> Result<DischargeSummary> {
        let requirements = tx.read(&self.tables.requirements);
        tx.read(&self.tables.discharges)
            .get(id.value())
            .map(|d| d.summary(requirements.get(&d.id)))
            .ok_or_else(|| HospitalError::not_found("discharge", "discharge_id", id))
    }
}

fn set_gate(gate: &mut bool, value: Option<bool>) {
    if let Some(value) = value {
        *gate = value;
    }
}
