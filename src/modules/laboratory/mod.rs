//! Laboratory: test catalog, lab orders and diagnostic reports

pub mod access;
pub mod model;
pub mod service;

pub use access::{LaboratoryAccess, StoreLaboratoryAccess};
pub use model::{
    DiagnosticReportSummary, LabOrderStatus, LabOrderSummary, NewDiagnosticReport, NewLabOrder,
    NewLabTest, ReportStatus, TestPrice,
};
pub use service::LaboratoryService;

use crate::adapters::memory::{RecordSet, Table};
use crate::modules::admission::AdmissionAccess;
use crate::modules::identity::IdentityAccess;
use model::{DiagnosticReport, LabOrder, LabTestDefinition};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
struct LaboratoryTables {
    /// Keyed by normalized test code
    tests: Arc<Table<BTreeMap<String, LabTestDefinition>>>,
    orders: Arc<Table<RecordSet<LabOrder>>>,
    reports: Arc<Table<RecordSet<DiagnosticReport>>>,
}

pub struct LaboratoryModule {
    pub access: Arc<dyn LaboratoryAccess>,
    pub service: Arc<LaboratoryService>,
}

impl LaboratoryModule {
    pub fn new(
        admission: Arc<dyn AdmissionAccess>,
        identity: Arc<dyn IdentityAccess>,
        currency: impl Into<String>,
    ) -> Self {
        let tables = LaboratoryTables {
            tests: Table::new("laboratory.tests", BTreeMap::new()),
            orders: Table::new("laboratory.orders", RecordSet::default()),
            reports: Table::new("laboratory.reports", RecordSet::default()),
        };
        Self {
            access: Arc::new(StoreLaboratoryAccess::new(tables.clone())),
            service: Arc::new(LaboratoryService::new(
                tables,
                admission,
                identity,
                currency.into(),
            )),
        }
    }
}
