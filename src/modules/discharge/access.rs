//! Read accessor for discharges

use super::model::DischargeSummary;
use super::DischargeTables;
use crate::domain::{DischargeId, EncounterId, PatientId};
use async_trait::async_trait;

#[async_trait]
pub trait DischargeAccess: Send + Sync {
    async fn validate_discharge_exists(&self, id: DischargeId) -> bool;

    async fn get_discharge_summary(&self, id: DischargeId) -> Option<DischargeSummary>;

    /// The encounter's discharge; there is at most one
    async fn get_encounter_discharge(&self, encounter_id: EncounterId)
        -> Option<DischargeSummary>;

    /// Every discharge of a patient, oldest first
    async fn list_patient_discharges(&self, patient_id: PatientId) -> Vec<DischargeSummary>;
}

pub struct StoreDischargeAccess {
    tables: DischargeTables,
}

impl StoreDischargeAccess {
    pub(super) fn new(tables: DischargeTables) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl DischargeAccess for StoreDischargeAccess {
    async fn validate_discharge_exists(&self, id: DischargeId) -> bool {
        self.tables.discharges.snapshot().contains(id.value())
    }

    async fn get_discharge_summary(&self, id: DischargeId) -> Option<DischargeSummary> {
        let requirements = self.tables.requirements.snapshot();
        self.tables
            .discharges
            .snapshot()
            .get(id.value())
            .map(|d| d.summary(requirements.get(&d.id)))
    }

    async fn get_encounter_discharge(
        &self,
        encounter_id: EncounterId,
    ) -> Option<DischargeSummary> {
        let requirements = self.tables.requirements.snapshot();
        self.tables
            .discharges
            .snapshot()
            .values()
            .find(|d| d.encounter_id == encounter_id)
            .map(|d| d.summary(requirements.get(&d.id)))
    }

    async fn list_patient_discharges(&self, patient_id: PatientId) -> Vec<DischargeSummary> {
        let requirements = self.tables.requirements.snapshot();
        self.tables
            .discharges
            .snapshot()
            .values()
            .filter(|d| d.patient_id == patient_id)
            .map(|d| d.summary(requirements.get(&d.id)))
            .collect()
    }
}
