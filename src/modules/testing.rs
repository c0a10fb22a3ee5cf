//! Stub accessors for module unit tests

use crate::adapters::memory::Transaction;
use crate::domain::{EncounterId, LocationId, OrganizationId, PatientId, PractitionerId};
use crate::modules::admission::{
    AdmissionAccess, EncounterClass, EncounterOverview, EncounterStatus, EncounterStatusChange,
    EncounterSummary, ProcedureSummary,
};
use crate::modules::identity::{
    IdentityAccess, LocationSummary, OrganizationKind, OrganizationSummary, PatientSummary,
    PractitionerSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
}

pub(crate) fn encounter(
    id: i64,
    patient: i64,
    class: EncounterClass,
    status: EncounterStatus,
) -> EncounterSummary {
    EncounterSummary {
        id: EncounterId::new(id),
        external_id: format!("ENC-20260314-{id:06X}"),
        patient_id: PatientId::new(patient),
        class,
        status,
        practitioner_id: None,
        location_id: None,
        organization_id: None,
        reason: None,
        period_start: Some(clock()),
        period_end: None,
    }
}

/// Admission accessor over a fixed list of encounters
#[derive(Clone)]
pub(crate) struct StubAdmission(pub Vec<EncounterSummary>);

#[async_trait]
impl AdmissionAccess for StubAdmission {
    async fn validate_encounter_exists(&self, id: EncounterId) -> bool {
        self.0.iter().any(|e| e.id == id)
    }

    async fn get_encounter_summary(&self, id: EncounterId) -> Option<EncounterSummary> {
        self.0.iter().find(|e| e.id == id).cloned()
    }

    async fn list_patient_encounters(&self, patient_id: PatientId) -> Vec<EncounterSummary> {
        self.0
            .iter()
            .filter(|e| e.patient_id == patient_id)
            .cloned()
            .collect()
    }

    async fn get_encounter_overview(&self, _id: EncounterId) -> Option<EncounterOverview> {
        None
    }

    async fn get_encounter_history(&self, _id: EncounterId) -> Vec<EncounterStatusChange> {
        Vec::new()
    }

    async fn list_encounter_procedures(&self, _id: EncounterId) -> Vec<ProcedureSummary> {
        Vec::new()
    }

    fn within<'a>(&'a self, _tx: &'a Transaction) -> Box<dyn AdmissionAccess + 'a> {
        Box::new(self.clone())
    }
}

/// Identity accessor where ids listed here exist and nothing else does
#[derive(Clone, Default)]
pub(crate) struct StubIdentity {
    pub organizations: Vec<i64>,
    pub practitioners: Vec<i64>,
    pub patients: Vec<i64>,
}

#[async_trait]
impl IdentityAccess for StubIdentity {
    async fn validate_organization_exists(&self, id: OrganizationId) -> bool {
        self.organizations.contains(&id.value())
    }

    async fn validate_location_exists(&self, _id: LocationId) -> bool {
        false
    }

    async fn validate_practitioner_exists(&self, id: PractitionerId) -> bool {
        self.practitioners.contains(&id.value())
    }

    async fn validate_patient_exists(&self, id: PatientId) -> bool {
        self.patients.contains(&id.value())
    }

    async fn get_organization_summary(&self, id: OrganizationId) -> Option<OrganizationSummary> {
        self.organizations
            .contains(&id.value())
            .then(|| OrganizationSummary {
                id,
                name: format!("Organization {id}"),
                kind: OrganizationKind::Hospital,
                active: true,
            })
    }

    async fn get_location_summary(&self, _id: LocationId) -> Option<LocationSummary> {
        None
    }

    async fn get_practitioner_summary(&self, _id: PractitionerId) -> Option<PractitionerSummary> {
        None
    }

    async fn get_patient_summary(&self, _id: PatientId) -> Option<PatientSummary> {
        None
    }

    async fn find_patient_by_external_id(&self, _external_id: &str) -> Option<PatientSummary> {
        None
    }

    async fn list_organization_locations(&self, _id: OrganizationId) -> Vec<LocationSummary> {
        Vec::new()
    }

    fn within<'a>(&'a self, _tx: &'a Transaction) -> Box<dyn IdentityAccess + 'a> {
        Box::new(self.clone())
    }
}
