//! Read accessor for encounters and procedures

use super::model::{EncounterOverview, EncounterStatusChange, EncounterSummary, ProcedureSummary};
use super::AdmissionTables;
use crate::adapters::memory::{Transaction, View};
use crate::domain::{EncounterId, PatientId};
use crate::modules::identity::IdentityAccess;
use async_trait::async_trait;
use std::sync::Arc;

pub const UNKNOWN_PRACTITIONER: &str = "Unknown Practitioner";
pub const UNKNOWN_PATIENT: &str = "Unknown Patient";

#[async_trait]
pub trait AdmissionAccess: Send + Sync {
    async fn validate_encounter_exists(&self, id: EncounterId) -> bool;

    async fn get_encounter_summary(&self, id: EncounterId) -> Option<EncounterSummary>;

    async fn list_patient_encounters(&self, patient_id: PatientId) -> Vec<EncounterSummary>;

    /// Encounter with patient, practitioner and location names resolved
    ///
    /// Unresolvable references degrade to placeholder names instead of failing.
    async fn get_encounter_overview(&self, id: EncounterId) -> Option<EncounterOverview>;

    async fn get_encounter_history(&self, id: EncounterId) -> Vec<EncounterStatusChange>;

    async fn list_encounter_procedures(&self, id: EncounterId) -> Vec<ProcedureSummary>;

    /// This accessor reading through `tx`, staged writes included
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn AdmissionAccess + 'a>;
}

pub struct StoreAdmissionAccess<'v> {
    tables: AdmissionTables,
    identity: Arc<dyn IdentityAccess>,
    view: View<'v>,
}

impl StoreAdmissionAccess<'static> {
    pub(super) fn new(tables: AdmissionTables, identity: Arc<dyn IdentityAccess>) -> Self {
        Self {
            tables,
            identity,
            view: View::Committed,
        }
    }
}

/// Resolves display names, degrading to placeholders
async fn overview(identity: &dyn IdentityAccess, encounter: EncounterSummary) -> EncounterOverview {
    let patient_name = identity
        .get_patient_summary(encounter.patient_id)
        .await
        .map(|p| p.full_name())
        .unwrap_or_else(|| UNKNOWN_PATIENT.to_string());

    let practitioner_name = match encounter.practitioner_id {
        Some(practitioner_id) => identity
            .get_practitioner_summary(practitioner_id)
            .await
            .map(|p| p.display_name),
        None => None,
    }
    .unwrap_or_else(|| UNKNOWN_PRACTITIONER.to_string());

    let location_name = match encounter.location_id {
        Some(location_id) => identity
            .get_location_summary(location_id)
            .await
            .map(|l| l.name),
        None => None,
    };

    EncounterOverview {
        encounter,
        patient_name,
        practitioner_name,
        location_name,
    }
}

#[async_trait]
impl<'v> AdmissionAccess for StoreAdmissionAccess<'v> {
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn AdmissionAccess + 'a> {
        Box::new(StoreAdmissionAccess {
            tables: self.tables.clone(),
            identity: self.identity.clone(),
            view: View::Pending(tx),
        })
    }

    async fn validate_encounter_exists(&self, id: EncounterId) -> bool {
        self.view.load(&self.tables.encounters).contains(id.value())
    }

    async fn get_encounter_summary(&self, id: EncounterId) -> Option<EncounterSummary> {
        self.view
            .load(&self.tables.encounters)
            .get(id.value())
            .map(|e| e.summary())
    }

    async fn list_patient_encounters(&self, patient_id: PatientId) -> Vec<EncounterSummary> {
        self.view
            .load(&self.tables.encounters)
            .values()
            .filter(|e| e.patient_id == patient_id)
            .map(|e| e.summary())
            .collect()
    }

    async fn get_encounter_overview(&self, id: EncounterId) -> Option<EncounterOverview> {
        let encounter = self.get_encounter_summary(id).await?;
        Some(match self.view {
            View::Committed => overview(self.identity.as_ref(), encounter).await,
            View::Pending(tx) => overview(self.identity.within(tx).as_ref(), encounter).await,
        })
    }

    async fn get_encounter_history(&self, id: EncounterId) -> Vec<EncounterStatusChange> {
        self.view
            .load(&self.tables.encounters)
            .get(id.value())
            .map(|e| e.status_history.clone())
            .unwrap_or_default()
    }

    async fn list_encounter_procedures(&self, id: EncounterId) -> Vec<ProcedureSummary> {
        self.view
            .load(&self.tables.procedures)
            .values()
            .filter(|p| p.encounter_id == id)
            .map(|p| p.summary())
            .collect()
    }
}
