//! Discharge workflow and the financial-clearance gatekeeper
//!
//! A discharge cannot complete while billing reports money outstanding on the
//! encounter. The inpatient encounter itself is finished by
//! [`CareOrchestrator::complete_discharge`](crate::core::orchestrator::CareOrchestrator::complete_discharge),
//! in the same transaction as the finalization.

pub mod access;
pub mod model;
pub mod service;

pub use access::{DischargeAccess, StoreDischargeAccess};
pub use model::{
    DischargeRequirements, DischargeStatus, DischargeSummary, DischargeUpdate, Disposition,
};
pub use service::DischargeService;

use crate::adapters::memory::{RecordSet, Table};
use crate::config::DischargeConfig;
use crate::modules::admission::AdmissionAccess;
use crate::modules::billing::BillingAccess;
use crate::modules::identity::IdentityAccess;
use model::Discharge;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
struct DischargeTables {
    discharges: Arc<Table<RecordSet<Discharge>>>,
    /// Checklist per discharge id, created when the discharge is initiated
    requirements: Arc<Table<BTreeMap<i64, DischargeRequirements>>>,
}

pub struct DischargeModule {
    pub access: Arc<dyn DischargeAccess>,
    pub service: Arc<DischargeService>,
}

impl DischargeModule {
    pub fn new(
        admission: Arc<dyn AdmissionAccess>,
        identity: Arc<dyn IdentityAccess>,
        billing: Arc<dyn BillingAccess>,
        config: &DischargeConfig,
    ) -> Self {
        let tables = DischargeTables {
            discharges: Table::new("discharge.discharges", RecordSet::default()),
            requirements: Table::new("discharge.requirements", BTreeMap::new()),
        };
        Self {
            access: Arc::new(StoreDischargeAccess::new(tables.clone())),
            service: Arc::new(DischargeService::new(
                tables,
                admission,
                identity,
                billing,
                config.enforce_checklist,
            )),
        }
    }
}
