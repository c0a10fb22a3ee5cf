//! Read accessor for the identity registry
//!
//! Lookups never fail: a miss is `false`, `None` or an empty list.

use super::model::{LocationSummary, OrganizationSummary, PatientSummary, PractitionerSummary};
use super::IdentityTables;
use crate::adapters::memory::{Transaction, View};
use crate::domain::{LocationId, OrganizationId, PatientId, PractitionerId};
use async_trait::async_trait;

#[async_trait]
pub trait IdentityAccess: Send + Sync {
    async fn validate_organization_exists(&self, id: OrganizationId) -> bool;

    async fn validate_location_exists(&self, id: LocationId) -> bool;

    async fn validate_practitioner_exists(&self, id: PractitionerId) -> bool;

    async fn validate_patient_exists(&self, id: PatientId) -> bool;

    async fn get_organization_summary(&self, id: OrganizationId) -> Option<OrganizationSummary>;

    async fn get_location_summary(&self, id: LocationId) -> Option<LocationSummary>;

    async fn get_practitioner_summary(&self, id: PractitionerId) -> Option<PractitionerSummary>;

    async fn get_patient_summary(&self, id: PatientId) -> Option<PatientSummary>;

    /// Looks a patient up by registry number (`WAH-2026-00001`)
    async fn find_patient_by_external_id(&self, external_id: &str) -> Option<PatientSummary>;

    async fn list_organization_locations(&self, id: OrganizationId) -> Vec<LocationSummary>;

    /// This accessor reading through `tx`, staged writes included
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn IdentityAccess + 'a>;
}

/// [`IdentityAccess`] over the module's tables, committed or as a transaction sees them
pub struct StoreIdentityAccess<'v> {
    tables: IdentityTables,
    view: View<'v>,
}

impl StoreIdentityAccess<'static> {
    pub(super) fn new(tables: IdentityTables) -> Self {
        Self {
            tables,
            view: View::Committed,
        }
    }
}

#[async_trait]
impl<'v> IdentityAccess for StoreIdentityAccess<'v> {
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn IdentityAccess + 'a> {
        Box::new(StoreIdentityAccess {
            tables: self.tables.clone(),
            view: View::Pending(tx),
        })
    }

    async fn validate_organization_exists(&self, id: OrganizationId) -> bool {
        self.view.load(&self.tables.organizations).contains(id.value())
    }

    async fn validate_location_exists(&self, id: LocationId) -> bool {
        self.view.load(&self.tables.locations).contains(id.value())
    }

    async fn validate_practitioner_exists(&self, id: PractitionerId) -> bool {
        self.view.load(&self.tables.practitioners).contains(id.value())
    }

    async fn validate_patient_exists(&self, id: PatientId) -> bool {
        self.view.load(&self.tables.patients).contains(id.value())
    }

    async fn get_organization_summary(&self, id: OrganizationId) -> Option<OrganizationSummary> {
        self.view
            .load(&self.tables.organizations)
            .get(id.value())
            .map(|o| o.summary())
    }

    async fn get_location_summary(&self, id: LocationId) -> Option<LocationSummary> {
        self.view
            .load(&self.tables.locations)
            .get(id.value())
            .map(|l| l.summary())
    }

    async fn get_practitioner_summary(&self, id: PractitionerId) -> Option<PractitionerSummary> {
        self.view
            .load(&self.tables.practitioners)
            .get(id.value())
            .map(|p| p.summary())
    }

    async fn get_patient_summary(&self, id: PatientId) -> Option<PatientSummary> {
        self.view
            .load(&self.tables.patients)
            .get(id.value())
            .map(|p| p.summary())
    }

    async fn find_patient_by_external_id(&self, external_id: &str) -> Option<PatientSummary> {
        let external_id = external_id.trim();
        self.view
            .load(&self.tables.patients)
            .values()
            .find(|p| p.external_id.eq_ignore_ascii_case(external_id))
            .map(|p| p.summary())
    }

    async fn list_organization_locations(&self, id: OrganizationId) -> Vec<LocationSummary> {
        self.view
            .load(&self.tables.locations)
            .values()
            .filter(|l| l.organization_id == id)
            .map(|l| l.summary())
            .collect()
    }
}
