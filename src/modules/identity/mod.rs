//! Identity registry: organizations, locations, practitioners, patients
//!
//! Every other module validates its foreign references against this registry
//! through [`IdentityAccess`].

pub mod access;
pub mod model;
pub mod service;

pub use access::{IdentityAccess, StoreIdentityAccess};
pub use model::{
    Gender, LocationKind, LocationSummary, NewLocation, NewOrganization, NewPatient,
    NewPractitioner, OrganizationKind, OrganizationSummary, PatientSummary,
    PractitionerSummary, Registration,
};
pub use service::IdentityService;

use crate::adapters::memory::{RecordSet, Table};
use crate::core::identifiers::SequentialIdGenerator;
use model::{Location, Organization, Patient, Practitioner};
use std::sync::Arc;

#[derive(Clone)]
struct IdentityTables {
    organizations: Arc<Table<RecordSet<Organization>>>,
    locations: Arc<Table<RecordSet<Location>>>,
    practitioners: Arc<Table<RecordSet<Practitioner>>>,
    patients: Arc<Table<RecordSet<Patient>>>,
}

impl IdentityTables {
    fn new() -> Self {
        Self {
            organizations: Table::new("identity.organizations", RecordSet::default()),
            locations: Table::new("identity.locations", RecordSet::default()),
            practitioners: Table::new("identity.practitioners", RecordSet::default()),
            patients: Table::new("identity.patients", RecordSet::default()),
        }
    }
}

/// The identity module's two surfaces over one private set of tables
pub struct IdentityModule {
    pub access: Arc<dyn IdentityAccess>,
    pub service: Arc<IdentityService>,
}

impl IdentityModule {
    pub fn new(ids: SequentialIdGenerator, patient_prefix: impl Into<String>) -> Self {
        let tables = IdentityTables::new();
        Self {
            access: Arc::new(StoreIdentityAccess::new(tables.clone())),
            service: Arc::new(IdentityService::new(tables, ids, patient_prefix.into())),
        }
    }
}
