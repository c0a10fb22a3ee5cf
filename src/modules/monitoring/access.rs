//! Read accessor for observations

use super::model::{ObservationStatus, ObservationSummary};
use super::MonitoringTables;
use crate::domain::{EncounterId, ObservationId};
use async_trait::async_trait;

#[async_trait]
pub trait MonitoringAccess: Send + Sync {
    async fn validate_observation_exists(&self, id: ObservationId) -> bool;

    async fn get_observation_summary(&self, id: ObservationId) -> Option<ObservationSummary>;

    /// Observations of an encounter, oldest first
    async fn list_encounter_observations(&self, encounter_id: EncounterId)
        -> Vec<ObservationSummary>;

    /// Most recent observation with `code`, ignoring ones entered in error
    async fn latest_observation(
        &self,
        encounter_id: EncounterId,
        code: &str,
    ) -> Option<ObservationSummary>;
}

pub struct StoreMonitoringAccess {
    tables: MonitoringTables,
}

impl StoreMonitoringAccess {
    pub(super) fn new(tables: MonitoringTables) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl MonitoringAccess for StoreMonitoringAccess {
    async fn validate_observation_exists(&self, id: ObservationId) -> bool {
        self.tables.observations.snapshot().contains(id.value())
    }

    async fn get_observation_summary(&self, id: ObservationId) -> Option<ObservationSummary> {
        self.tables
            .observations
            .snapshot()
            .get(id.value())
            .map(|o| o.summary())
    }

    async fn list_encounter_observations(
        &self,
        encounter_id: EncounterId,
    ) -> Vec<ObservationSummary> {
        let mut observations: Vec<_> = self
            .tables
            .observations
            .snapshot()
            .values()
            .filter(|o| o.encounter_id == encounter_id)
            .map(|o| o.summary())
            .collect();
        observations.sort_by_key(|o| (o.observed_at, o.id));
        observations
    }

    async fn latest_observation(
        &self,
        encounter_id: EncounterId,
        code: &str,
    ) -> Option<ObservationSummary> {
        let code = code.trim();
        self.tables
            .observations
            .snapshot()
            .values()
            .filter(|o| o.encounter_id == encounter_id && o.code == code)
            .filter(|o| o.status != ObservationStatus::EnteredInError)
            .max_by_key(|o| (o.observed_at, o.id))
            .map(|o| o.summary())
    }
}
