//! Admission: encounters and the procedures recorded against them
//!
//! Encounters move through the lifecycle in [`model::EncounterStatus`]; every
//! other clinical record attaches to an encounter and takes its patient from it.

pub mod access;
pub mod model;
pub mod service;

pub use access::{AdmissionAccess, StoreAdmissionAccess};
pub use model::{
    validate_encounter_status_transition, EncounterClass, EncounterOverview, EncounterStatus,
    EncounterStatusChange, EncounterSummary, NewEncounter, NewProcedure, PerformerInput,
    PerformerSummary, ProcedureSummary,
};
pub use service::{AdmissionService, Admitted};

use crate::adapters::memory::{RecordSet, Table};
use crate::config::IdentifierConfig;
use crate::modules::identity::IdentityAccess;
use model::{Encounter, Procedure};
use std::sync::Arc;

#[derive(Clone)]
struct AdmissionTables {
    encounters: Arc<Table<RecordSet<Encounter>>>,
    procedures: Arc<Table<RecordSet<Procedure>>>,
}

impl AdmissionTables {
    fn new() -> Self {
        Self {
            encounters: Table::new("admission.encounters", RecordSet::default()),
            procedures: Table::new("admission.procedures", RecordSet::default()),
        }
    }
}

pub struct AdmissionModule {
    pub access: Arc<dyn AdmissionAccess>,
    pub service: Arc<AdmissionService>,
}

impl AdmissionModule {
    pub fn new(identity: Arc<dyn IdentityAccess>, config: &IdentifierConfig) -> Self {
        let tables = AdmissionTables::new();
        Self {
            access: Arc::new(StoreAdmissionAccess::new(tables.clone(), identity.clone())),
            service: Arc::new(AdmissionService::new(tables, identity, config)),
        }
    }
}
