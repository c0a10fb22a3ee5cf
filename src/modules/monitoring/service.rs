//! Write service for observations

use super::model::{NewObservation, Observation, ObservationStatus, ObservationSummary};
use super::MonitoringTables;
use crate::adapters::memory::Transaction;
use crate::domain::validate::required_text;
use crate::domain::{HospitalError, ObservationId, RequestContext, Result};
use crate::modules::admission::{AdmissionAccess, EncounterStatus};
use std::sync::Arc;

pub struct MonitoringService {
    tables: MonitoringTables,
    admission: Arc<dyn AdmissionAccess>,
}

impl MonitoringService {
    pub(super) fn new(tables: MonitoringTables, admission: Arc<dyn AdmissionAccess>) -> Self {
        Self { tables, admission }
    }

    /// Records an observation, taking the patient from the encounter
    pub async fn record_observation(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewObservation,
    ) -> Result<ObservationSummary> {
        let code = required_text("code", &input.code)?;
        let unit = required_text("unit", &input.unit)?;

        let encounter = self
            .admission
            .within(tx)
            .get_encounter_summary(input.encounter_id)
            .await
            .ok_or_else(|| {
                HospitalError::not_found("encounter", "encounter_id", input.encounter_id)
            })?;
        if matches!(
            encounter.status,
            EncounterStatus::Cancelled | EncounterStatus::EnteredInError
        ) {
            return Err(HospitalError::Validation(format!(
                "encounter {} is {}",
                encounter.id, encounter.status
            )));
        }

        let observation = tx
            .write(&self.tables.observations)
            .create(|id| Observation {
                id,
                encounter_id: encounter.id,
                patient_id: encounter.patient_id,
                code,
                value: input.value,
                unit,
                status: input.status.unwrap_or(ObservationStatus::Final),
                observed_at: input.observed_at.unwrap_or_else(|| ctx.now()),
            })
            .summary();

        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            observation_id = %observation.id,
            encounter_id = %observation.encounter_id,
            code = %observation.code,
            "Observation recorded"
        );
        Ok(observation)
    }

    /// Finalizes a preliminary observation or retracts one entered in error
    pub async fn set_observation_status(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: ObservationId,
        to: ObservationStatus,
    ) -> Result<ObservationSummary> {
        let observation = tx
            .write(&self.tables.observations)
            .get_mut(id.value())
            .ok_or_else(|| HospitalError::not_found("observation", "observation_id", id))?;
        observation.set_status(to)?;

        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            observation_id = %id,
            status = %to,
            "Observation status changed"
        );
        Ok(observation.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{MonitoringAccess, MonitoringModule};
    use super::*;
    use crate::adapters::memory::Database;
    use crate::domain::{EncounterId, PatientId};
    use crate::modules::admission::EncounterClass;
    use crate::modules::testing::{clock, encounter, StubAdmission};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn module() -> MonitoringModule {
        MonitoringModule::new(Arc::new(StubAdmission(vec![
            encounter(1, 10, EncounterClass::Inpatient, EncounterStatus::InProgress),
            encounter(2, 11, EncounterClass::Outpatient, EncounterStatus::Cancelled),
        ])))
    }

    fn temperature(encounter_id: i64, value: rust_decimal::Decimal, minutes: i64) -> NewObservation {
        NewObservation {
            encounter_id: EncounterId::new(encounter_id),
            code: "8310-5".to_string(),
            value,
            unit: "Cel".to_string(),
            status: None,
            observed_at: Some(clock() + Duration::minutes(minutes)),
        }
    }

    #[tokio::test]
    async fn test_observation_inherits_patient() {
        let monitoring = module();
        let db = Database::new();
        let ctx = RequestContext::at(clock());

        let mut tx = db.begin().await;
        let obs = monitoring
            .service
            .record_observation(&ctx, &mut tx, temperature(1, dec!(38.2), 0))
            .await
            .unwrap();
        tx.commit();

        assert_eq!(obs.patient_id, PatientId::new(10));
        assert_eq!(obs.status, ObservationStatus::Final);
        assert!(monitoring.access.validate_observation_exists(obs.id).await);
    }

    #[tokio::test]
    async fn test_rejects_unknown_or_cancelled_encounter() {
        let monitoring = module();
        let db = Database::new();
        let ctx = RequestContext::at(clock());
        let mut tx = db.begin().await;

        let unknown = monitoring
            .service
            .record_observation(&ctx, &mut tx, temperature(9, dec!(37.0), 0))
            .await
            .unwrap_err();
        assert!(matches!(unknown, HospitalError::ReferencedEntityNotFound { .. }));

        let cancelled = monitoring
            .service
            .record_observation(&ctx, &mut tx, temperature(2, dec!(37.0), 0))
            .await
            .unwrap_err();
        assert!(matches!(cancelled, HospitalError::Validation(_)));
    }

    #[tokio::test]
    async fn test_latest_observation_skips_entered_in_error() {
        let monitoring = module();
        let db = Database::new();
        let ctx = RequestContext::at(clock());

        let mut tx = db.begin().await;
        let first = monitoring
            .service
            .record_observation(&ctx, &mut tx, temperature(1, dec!(38.2), 0))
            .await
            .unwrap();
        let second = monitoring
            .service
            .record_observation(&ctx, &mut tx, temperature(1, dec!(83.2), 30))
            .await
            .unwrap();
        monitoring
            .service
            .set_observation_status(&ctx, &mut tx, second.id, ObservationStatus::EnteredInError)
            .await
            .unwrap();
        tx.commit();

        let latest = monitoring
            .access
            .latest_observation(EncounterId::new(1), "8310-5")
            .await
            .unwrap();
        assert_eq!(latest.id, first.id);
        assert_eq!(
            monitoring
                .access
                .list_encounter_observations(EncounterId::new(1))
                .await
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_final_observation_cannot_revert() {
        let monitoring = module();
        let db = Database::new();
        let ctx = RequestContext::at(clock());
        let mut tx = db.begin().await;

        let obs = monitoring
            .service
            .record_observation(&ctx, &mut tx, temperature(1, dec!(36.9), 0))
            .await
            .unwrap();
        let err = monitoring
            .service
            .set_observation_status(&ctx, &mut tx, obs.id, ObservationStatus::Preliminary)
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidStateTransition { .. }));
    }
}
