//! Read accessor for the laboratory

use super::model::{test_key, DiagnosticReportSummary, LabOrderSummary, TestPrice};
use super::LaboratoryTables;
use crate::adapters::memory::{Transaction, View};
use crate::domain::{DiagnosticReportId, EncounterId, LabOrderId, PatientId};
use async_trait::async_trait;

#[async_trait]
pub trait LaboratoryAccess: Send + Sync {
    async fn validate_test_exists(&self, code: &str) -> bool;

    /// Catalog price for `code`, `None` when the test is not defined
    async fn get_test_price(&self, code: &str) -> Option<TestPrice>;

    async fn validate_lab_order_exists(&self, id: LabOrderId) -> bool;

    async fn get_lab_order_summary(&self, id: LabOrderId) -> Option<LabOrderSummary>;

    async fn list_encounter_lab_orders(&self, encounter_id: EncounterId) -> Vec<LabOrderSummary>;

    async fn validate_report_exists(&self, id: DiagnosticReportId) -> bool;

    async fn get_report_summary(&self, id: DiagnosticReportId) -> Option<DiagnosticReportSummary>;

    /// Reports of a patient, narrowed to one encounter when given
    async fn get_patient_reports(
        &self,
        patient_id: PatientId,
        encounter_id: Option<EncounterId>,
    ) -> Vec<DiagnosticReportSummary>;

    /// This accessor reading through `tx`, staged writes included
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn LaboratoryAccess + 'a>;
}

pub struct StoreLaboratoryAccess<'v> {
    tables: LaboratoryTables,
    view: View<'v>,
}

impl StoreLaboratoryAccess<'static> {
    pub(super) fn new(tables: LaboratoryTables) -> Self {
        Self {
            tables,
            view: View::Committed,
        }
    }
}

#[async_trait]
impl<'v> LaboratoryAccess for StoreLaboratoryAccess<'v> {
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn LaboratoryAccess + 'a> {
        Box::new(StoreLaboratoryAccess {
            tables: self.tables.clone(),
            view: View::Pending(tx),
        })
    }

    async fn validate_test_exists(&self, code: &str) -> bool {
        self.view.load(&self.tables.tests).contains_key(&test_key(code))
    }

    async fn get_test_price(&self, code: &str) -> Option<TestPrice> {
        self.view
            .load(&self.tables.tests)
            .get(&test_key(code))
            .map(|t| t.price())
    }

    async fn validate_lab_order_exists(&self, id: LabOrderId) -> bool {
        self.view.load(&self.tables.orders).contains(id.value())
    }

    async fn get_lab_order_summary(&self, id: LabOrderId) -> Option<LabOrderSummary> {
        self.view
            .load(&self.tables.orders)
            .get(id.value())
            .map(|o| o.summary())
    }

    async fn list_encounter_lab_orders(&self, encounter_id: EncounterId) -> Vec<LabOrderSummary> {
        self.view
            .load(&self.tables.orders)
            .values()
            .filter(|o| o.encounter_id == encounter_id)
            .map(|o| o.summary())
            .collect()
    }

    async fn validate_report_exists(&self, id: DiagnosticReportId) -> bool {
        self.view.load(&self.tables.reports).contains(id.value())
    }

    async fn get_report_summary(&self, id: DiagnosticReportId) -> Option<DiagnosticReportSummary> {
        self.view
            .load(&self.tables.reports)
            .get(id.value())
            .map(|r| r.summary())
    }

    async fn get_patient_reports(
        &self,
        patient_id: PatientId,
        encounter_id: Option<EncounterId>,
    ) -> Vec<DiagnosticReportSummary> {
        self.view
            .load(&self.tables.reports)
            .values()
            .filter(|r| r.patient_id == patient_id)
            .filter(|r| encounter_id.is_none() || r.encounter_id == encounter_id)
            .map(|r| r.summary())
            .collect()
    }
}
