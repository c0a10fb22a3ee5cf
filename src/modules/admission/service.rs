//! Write service for encounters and procedures

use super::model::{
    Encounter, EncounterClass, EncounterStatus, EncounterSummary, NewEncounter, NewProcedure,
    PerformerSummary, Procedure, ProcedureSummary,
};
use super::AdmissionTables;
use crate::adapters::memory::Transaction;
use crate::config::IdentifierConfig;
use crate::core::events::DomainEvent;
use crate::core::identifiers::generate_unique_dated;
use crate::domain::validate::{optional_text, required_text};
use crate::domain::{EncounterId, HospitalError, RequestContext, Result};
use crate::modules::identity::IdentityAccess;
use std::sync::Arc;

/// A committed-to-be encounter plus the events its creation implies
#[derive(Debug, Clone)]
pub struct Admitted {
    pub encounter: EncounterSummary,
    pub events: Vec<DomainEvent>,
}

pub struct AdmissionService {
    tables: AdmissionTables,
    identity: Arc<dyn IdentityAccess>,
    encounter_prefix: String,
    procedure_prefix: String,
    random_attempts: usize,
}

impl AdmissionService {
    pub(super) fn new(
        tables: AdmissionTables,
        identity: Arc<dyn IdentityAccess>,
        config: &IdentifierConfig,
    ) -> Self {
        Self {
            tables,
            identity,
            encounter_prefix: config.encounter_prefix.clone(),
            procedure_prefix: config.procedure_prefix.clone(),
            random_attempts: config.random_attempts,
        }
    }

    /// Opens an encounter for a registered patient
    ///
    /// The patient is given by registry number; every optional reference is
    /// checked through the identity accessor. Returns an
    /// [`DomainEvent::EncounterCreated`] for the caller to dispatch after commit.
    pub async fn create_encounter(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewEncounter,
    ) -> Result<Admitted> {
        let patient_ref = required_text("patient_id", &input.patient_external_id)?;
        let patient = self
            .identity
            .within(tx)
            .find_patient_by_external_id(&patient_ref)
            .await
            .ok_or_else(|| HospitalError::not_found("patient", "patient_id", &patient_ref))?;

        if let Some(id) = input.practitioner_id {
            if !self.identity.within(tx).validate_practitioner_exists(id).await {
                return Err(HospitalError::not_found("practitioner", "practitioner_id", id));
            }
        }
        if let Some(id) = input.location_id {
            if !self.identity.within(tx).validate_location_exists(id).await {
                return Err(HospitalError::not_found("location", "location_id", id));
            }
        }
        if let Some(id) = input.organization_id {
            if !self.identity.within(tx).validate_organization_exists(id).await {
                return Err(HospitalError::not_found("organization", "organization_id", id));
            }
        }

        let status = input.status.unwrap_or(EncounterStatus::Planned);
        if status.is_terminal() {
            return Err(HospitalError::Validation(format!(
                "an encounter cannot start as '{status}'"
            )));
        }

        let external_id = {
            let encounters = tx.read(&self.tables.encounters);
            generate_unique_dated(
                &self.encounter_prefix,
                ctx.today(),
                self.random_attempts,
                &mut rand::thread_rng(),
                |candidate| encounters.values().any(|e| e.external_id == candidate),
            )?
        };

        let now = ctx.now();
        let encounter = tx
            .write(&self.tables.encounters)
            .create(|id| Encounter {
                id,
                external_id,
                patient_id: patient.id,
                class: input.class,
                status,
                practitioner_id: input.practitioner_id,
                location_id: input.location_id,
                organization_id: input.organization_id,
                reason: optional_text(input.reason),
                period_start: (status == EncounterStatus::InProgress).then_some(now),
                period_end: None,
                status_history: Vec::new(),
            })
            .summary();

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            encounter_id = %encounter.id,
            external_id = %encounter.external_id,
            patient_id = %encounter.patient_id,
            class = %encounter.class,
            "Encounter created"
        );

        let events = vec![DomainEvent::EncounterCreated {
            encounter_id: encounter.id,
            patient_id: encounter.patient_id,
            class: encounter.class,
        }];
        Ok(Admitted { encounter, events })
    }

    /// Moves an encounter one step through its lifecycle
    ///
    /// Inpatient encounters cannot be set to `finished` here; they finish when
    /// their discharge completes.
    pub async fn update_encounter_status(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: EncounterId,
        to: EncounterStatus,
    ) -> Result<EncounterSummary> {
        let encounter = tx
            .write(&self.tables.encounters)
            .get_mut(id.value())
            .ok_or_else(|| HospitalError::not_found("encounter", "encounter_id", id))?;

        if encounter.class == EncounterClass::Inpatient && to == EncounterStatus::Finished {
            return Err(HospitalError::transition(
                "inpatient encounter (finish through discharge)",
                encounter.status,
                to,
            ));
        }

        let from = encounter.status;
        encounter.apply_status(to, ctx.now())?;

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            encounter_id = %id,
            from = %from,
            to = %to,
            "Encounter status changed"
        );
        Ok(encounter.summary())
    }

    /// Finishes an encounter as part of a completed discharge
    pub(crate) async fn finish_after_discharge(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: EncounterId,
    ) -> Result<EncounterSummary> {
        let encounter = tx
            .write(&self.tables.encounters)
            .get_mut(id.value())
            .ok_or_else(|| HospitalError::not_found("encounter", "encounter_id", id))?;
        encounter.apply_status(EncounterStatus::Finished, ctx.now())?;

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            encounter_id = %id,
            "Encounter finished by discharge"
        );
        Ok(encounter.summary())
    }

    /// Records a procedure against an encounter
    ///
    /// The procedure's patient is copied from the encounter.
    pub async fn add_procedure(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewProcedure,
    ) -> Result<ProcedureSummary> {
        let code = required_text("code", &input.code)?;

        let encounter = tx
            .read(&self.tables.encounters)
            .get(input.encounter_id.value())
            .map(|e| e.summary())
            .ok_or_else(|| {
                HospitalError::not_found("encounter", "encounter_id", input.encounter_id)
            })?;

        if let Some(patient_id) = input.patient_id {
            if patient_id != encounter.patient_id {
                return Err(HospitalError::Validation(format!(
                    "patient {} does not match encounter {} (patient {})",
                    patient_id, encounter.id, encounter.patient_id
                )));
            }
        }
        if matches!(
            encounter.status,
            EncounterStatus::Cancelled | EncounterStatus::EnteredInError
        ) {
            return Err(HospitalError::Validation(format!(
                "encounter {} is {}",
                encounter.id, encounter.status
            )));
        }

        let mut performers = Vec::with_capacity(input.performers.len());
        for performer in input.performers {
            if !self
                .identity
                .within(tx)
                .validate_practitioner_exists(performer.practitioner_id)
                .await
            {
                return Err(HospitalError::not_found(
                    "practitioner",
                    "performers.practitioner_id",
                    performer.practitioner_id,
                ));
            }
            performers.push(PerformerSummary {
                practitioner_id: performer.practitioner_id,
                role: required_text("performers.role", &performer.role)?,
            });
        }

        let external_id = {
            let procedures = tx.read(&self.tables.procedures);
            generate_unique_dated(
                &self.procedure_prefix,
                ctx.today(),
                self.random_attempts,
                &mut rand::thread_rng(),
                |candidate| procedures.values().any(|p| p.external_id == candidate),
            )?
        };

        let procedure = tx
            .write(&self.tables.procedures)
            .create(|id| Procedure {
                id,
                external_id,
                encounter_id: encounter.id,
                patient_id: encounter.patient_id,
                code,
                display: optional_text(input.display),
                performed_at: input.performed_at.unwrap_or_else(|| ctx.now()),
                performers,
            })
            .summary();

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            procedure_id = %procedure.id,
            encounter_id = %procedure.encounter_id,
            code = %procedure.code,
            "Procedure recorded"
        );
        Ok(procedure)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{AdmissionAccess, AdmissionModule, PerformerInput};
    use super::*;
    use crate::adapters::memory::Database;
    use crate::domain::{LocationId, OrganizationId, PatientId, PractitionerId};
    use crate::modules::identity::{
        Gender, LocationSummary, OrganizationSummary, PatientSummary, PractitionerSummary,
    };
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use regex::Regex;

    /// One patient (`WAH-2026-00001`) and one practitioner (id 7)
    #[derive(Clone)]
    struct StubIdentity;

    fn stub_patient() -> PatientSummary {
        PatientSummary {
            id: PatientId::new(1),
            external_id: "WAH-2026-00001".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1980, 5, 17).unwrap(),
            gender: Gender::Female,
            phone: None,
            registered_at: Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap(),
        }
    }

    #[async_trait]
    impl IdentityAccess for StubIdentity {
        async fn validate_organization_exists(&self, _id: OrganizationId) -> bool {
            false
        }
        async fn validate_location_exists(&self, _id: LocationId) -> bool {
            false
        }
        async fn validate_practitioner_exists(&self, id: PractitionerId) -> bool {
            id.value() == 7
        }
        async fn validate_patient_exists(&self, id: PatientId) -> bool {
            id.value() == 1
        }
        async fn get_organization_summary(&self, _id: OrganizationId) -> Option<OrganizationSummary> {
            None
        }
        async fn get_location_summary(&self, _id: LocationId) -> Option<LocationSummary> {
            None
        }
        async fn get_practitioner_summary(&self, _id: PractitionerId) -> Option<PractitionerSummary> {
            // Registered but since removed: the overview must still render
            None
        }
        async fn get_patient_summary(&self, id: PatientId) -> Option<PatientSummary> {
            (id.value() == 1).then(stub_patient)
        }
        async fn find_patient_by_external_id(&self, external_id: &str) -> Option<PatientSummary> {
            (external_id == "WAH-2026-00001").then(stub_patient)
        }
        async fn list_organization_locations(&self, _id: OrganizationId) -> Vec<LocationSummary> {
            Vec::new()
        }
        fn within<'a>(&'a self, _tx: &'a Transaction) -> Box<dyn IdentityAccess + 'a> {
            Box::new(self.clone())
        }
    }

    fn module() -> AdmissionModule {
        AdmissionModule::new(Arc::new(StubIdentity), &IdentifierConfig::default())
    }

    fn ctx() -> RequestContext {
        RequestContext::at(Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap())
    }

    fn inpatient() -> NewEncounter {
        NewEncounter {
            patient_external_id: "WAH-2026-00001".to_string(),
            class: EncounterClass::Inpatient,
            status: Some(EncounterStatus::Arrived),
            practitioner_id: Some(PractitionerId::new(7)),
            location_id: None,
            organization_id: None,
            reason: Some("Community-acquired pneumonia".to_string()),
        }
    }

    async fn admit(admission: &AdmissionModule, db: &Database, input: NewEncounter) -> Admitted {
        let mut tx = db.begin().await;
        let admitted = admission
            .service
            .create_encounter(&ctx(), &mut tx, input)
            .await
            .unwrap();
        tx.commit();
        admitted
    }

    #[tokio::test]
    async fn test_create_encounter_identifier_format_and_event() {
        let admission = module();
        let db = Database::new();
        let pattern = Regex::new(r"^ENC-\d{8}-[0-9A-F]{6}$").unwrap();

        let first = admit(&admission, &db, inpatient()).await;
        let second = admit(&admission, &db, inpatient()).await;

        assert!(pattern.is_match(&first.encounter.external_id));
        assert!(first.encounter.external_id.starts_with("ENC-20260314-"));
        assert_ne!(first.encounter.external_id, second.encounter.external_id);
        assert_eq!(
            first.events,
            vec![DomainEvent::EncounterCreated {
                encounter_id: first.encounter.id,
                patient_id: PatientId::new(1),
                class: EncounterClass::Inpatient,
            }]
        );
    }

    #[tokio::test]
    async fn test_create_encounter_unknown_patient() {
        let admission = module();
        let db = Database::new();
        let mut tx = db.begin().await;

        let err = admission
            .service
            .create_encounter(
                &ctx(),
                &mut tx,
                NewEncounter {
                    patient_external_id: "WAH-2026-99999".to_string(),
                    ..inpatient()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            HospitalError::ReferencedEntityNotFound { ref entity, ref field, .. }
                if entity == "patient" && field == "patient_id"
        ));
    }

    #[tokio::test]
    async fn test_create_encounter_unknown_practitioner() {
        let admission = module();
        let db = Database::new();
        let mut tx = db.begin().await;

        let err = admission
            .service
            .create_encounter(
                &ctx(),
                &mut tx,
                NewEncounter {
                    practitioner_id: Some(PractitionerId::new(8)),
                    ..inpatient()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HospitalError::ReferencedEntityNotFound { ref field, .. } if field == "practitioner_id"
        ));
    }

    #[tokio::test]
    async fn test_inpatient_cannot_finish_directly() {
        let admission = module();
        let db = Database::new();
        let encounter = admit(&admission, &db, inpatient()).await.encounter;

        let mut tx = db.begin().await;
        admission
            .service
            .update_encounter_status(&ctx(), &mut tx, encounter.id, EncounterStatus::InProgress)
            .await
            .unwrap();
        let err = admission
            .service
            .update_encounter_status(&ctx(), &mut tx, encounter.id, EncounterStatus::Finished)
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidStateTransition { .. }));

        let finished = admission
            .service
            .finish_after_discharge(&ctx(), &mut tx, encounter.id)
            .await
            .unwrap();
        tx.commit();

        assert_eq!(finished.status, EncounterStatus::Finished);
        assert!(finished.period_start.is_some());
        assert!(finished.period_end.is_some());
        assert_eq!(
            admission.access.get_encounter_history(encounter.id).await.len(),
            2
        );
    }

    #[tokio::test]
    async fn test_outpatient_finishes_through_status_update() {
        let admission = module();
        let db = Database::new();
        let encounter = admit(
            &admission,
            &db,
            NewEncounter {
                class: EncounterClass::Outpatient,
                status: Some(EncounterStatus::InProgress),
                ..inpatient()
            },
        )
        .await
        .encounter;
        assert!(encounter.period_start.is_some());

        let mut tx = db.begin().await;
        let finished = admission
            .service
            .update_encounter_status(&ctx(), &mut tx, encounter.id, EncounterStatus::Finished)
            .await
            .unwrap();
        tx.commit();
        assert_eq!(finished.status, EncounterStatus::Finished);
    }

    #[tokio::test]
    async fn test_procedure_takes_patient_from_encounter() {
        let admission = module();
        let db = Database::new();
        let encounter = admit(&admission, &db, inpatient()).await.encounter;

        let mut tx = db.begin().await;
        let mismatch = admission
            .service
            .add_procedure(
                &ctx(),
                &mut tx,
                NewProcedure {
                    encounter_id: encounter.id,
                    patient_id: Some(PatientId::new(2)),
                    code: "71045".to_string(),
                    display: Some("Chest X-ray".to_string()),
                    performed_at: None,
                    performers: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(mismatch, HospitalError::Validation(_)));

        let procedure = admission
            .service
            .add_procedure(
                &ctx(),
                &mut tx,
                NewProcedure {
                    encounter_id: encounter.id,
                    patient_id: None,
                    code: "71045".to_string(),
                    display: Some("Chest X-ray".to_string()),
                    performed_at: None,
                    performers: vec![PerformerInput {
                        practitioner_id: PractitionerId::new(7),
                        role: "radiologist".to_string(),
                    }],
                },
            )
            .await
            .unwrap();
        tx.commit();

        assert_eq!(procedure.patient_id, PatientId::new(1));
        assert!(procedure.external_id.starts_with("PROC-20260314-"));
        assert_eq!(
            admission
                .access
                .list_encounter_procedures(encounter.id)
                .await,
            vec![procedure]
        );
    }

    #[tokio::test]
    async fn test_overview_degrades_for_missing_practitioner() {
        let admission = module();
        let db = Database::new();
        let encounter = admit(&admission, &db, inpatient()).await.encounter;

        let overview = admission
            .access
            .get_encounter_overview(encounter.id)
            .await
            .unwrap();
        assert_eq!(overview.patient_name, "Jane Doe");
        assert_eq!(overview.practitioner_name, "Unknown Practitioner");
        assert!(overview.location_name.is_none());

        assert!(admission
            .access
            .get_encounter_overview(EncounterId::new(404))
            .await
            .is_none());
    }
}
