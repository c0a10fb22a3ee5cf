//! Write service for the laboratory

use super::model::{
    test_key, DiagnosticReport, DiagnosticReportSummary, LabOrder, LabOrderStatus,
    LabOrderSummary, LabTestDefinition, NewDiagnosticReport, NewLabOrder, NewLabTest,
    ReportStatus, TestPrice,
};
use super::LaboratoryTables;
use crate::adapters::memory::Transaction;
use crate::domain::money::{ensure_non_negative, normalize_currency};
use crate::domain::validate::{optional_text, required_text};
use crate::domain::{
    DiagnosticReportId, HospitalError, InvoiceId, LabOrderId, RequestContext, Result,
};
use crate::modules::admission::{AdmissionAccess, EncounterStatus};
use crate::modules::identity::IdentityAccess;
use std::sync::Arc;

pub struct LaboratoryService {
    tables: LaboratoryTables,
    admission: Arc<dyn AdmissionAccess>,
    identity: Arc<dyn IdentityAccess>,
    currency: String,
}

impl LaboratoryService {
    pub(super) fn new(
        tables: LaboratoryTables,
        admission: Arc<dyn AdmissionAccess>,
        identity: Arc<dyn IdentityAccess>,
        currency: String,
    ) -> Self {
        Self {
            tables,
            admission,
            identity,
            currency,
        }
    }

    pub async fn add_test_definition(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewLabTest,
    ) -> Result<TestPrice> {
        let code = test_key(&required_text("code", &input.code)?);
        let name = required_text("name", &input.name)?;
        let base_price = ensure_non_negative("base_price", input.base_price)?;
        let currency = normalize_currency(input.currency.as_deref().unwrap_or(&self.currency))?;

        let tests = tx.write(&self.tables.tests);
        if tests.contains_key(&code) {
            return Err(HospitalError::Conflict(format!(
                "lab test {code} already exists"
            )));
        }
        let definition = LabTestDefinition {
            code: code.clone(),
            name,
            base_price,
            currency,
        };
        let price = definition.price();
        tests.insert(code, definition);

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            code = %price.code,
            base_price = %price.base_price,
            "Lab test defined"
        );
        Ok(price)
    }

    /// Requests a test for an encounter, taking the patient from it
    pub async fn create_lab_order(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewLabOrder,
    ) -> Result<LabOrderSummary> {
        let test_code = test_key(&required_text("test_code", &input.test_code)?);

        let encounter = self
            .admission
            .within(tx)
            .get_encounter_summary(input.encounter_id)
            .await
            .ok_or_else(|| {
                HospitalError::not_found("encounter", "encounter_id", input.encounter_id)
            })?;
        if matches!(
            encounter.status,
            EncounterStatus::Cancelled | EncounterStatus::EnteredInError
        ) {
            return Err(HospitalError::Validation(format!(
                "encounter {} is {}",
                encounter.id, encounter.status
            )));
        }
        if let Some(requester) = input.requester_id {
            if !self.identity.within(tx).validate_practitioner_exists(requester).await {
                return Err(HospitalError::not_found(
                    "practitioner",
                    "requester_id",
                    requester,
                ));
            }
        }

        let order = tx
            .write(&self.tables.orders)
            .create(|id| LabOrder {
                id,
                encounter_id: encounter.id,
                patient_id: encounter.patient_id,
                test_code,
                requester_id: input.requester_id,
                status: LabOrderStatus::Requested,
                requested_at: ctx.now(),
            })
            .summary();

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            lab_order_id = %order.id,
            encounter_id = %order.encounter_id,
            test_code = %order.test_code,
            "Lab order created"
        );
        Ok(order)
    }

    pub async fn cancel_lab_order(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: LabOrderId,
    ) -> Result<LabOrderSummary> {
        let order = tx
            .write(&self.tables.orders)
            .get_mut(id.value())
            .ok_or_else(|| HospitalError::not_found("lab order", "lab_order_id", id))?;
        if order.status != LabOrderStatus::Requested {
            return Err(HospitalError::transition(
                "lab order",
                order.status,
                LabOrderStatus::Cancelled,
            ));
        }
        order.status = LabOrderStatus::Cancelled;

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            lab_order_id = %id,
            "Lab order cancelled"
        );
        Ok(order.summary())
    }

    /// Files a diagnostic report
    ///
    /// A report filed as `final` completes its lab order.
    pub async fn create_diagnostic_report(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewDiagnosticReport,
    ) -> Result<DiagnosticReportSummary> {
        if !self.identity.within(tx).validate_patient_exists(input.patient_id).await {
            return Err(HospitalError::not_found(
                "patient",
                "patient_id",
                input.patient_id,
            ));
        }

        let mut encounter_id = input.encounter_id;
        if let Some(id) = encounter_id {
            let encounter = self
                .admission
                .within(tx)
                .get_encounter_summary(id)
                .await
                .ok_or_else(|| HospitalError::not_found("encounter", "encounter_id", id))?;
            if encounter.patient_id != input.patient_id {
                return Err(HospitalError::Validation(format!(
                    "patient {} does not match encounter {id}",
                    input.patient_id
                )));
            }
        }

        let mut test_code = input.test_code.as_deref().map(test_key).filter(|c| !c.is_empty());
        if let Some(order_id) = input.lab_order_id {
            let order = tx
                .read(&self.tables.orders)
                .get(order_id.value())
                .map(|o| o.summary())
                .ok_or_else(|| HospitalError::not_found("lab order", "lab_order_id", order_id))?;
            if order.patient_id != input.patient_id
                || encounter_id.is_some_and(|id| id != order.encounter_id)
            {
                return Err(HospitalError::Validation(format!(
                    "lab order {order_id} belongs to a different patient or encounter"
                )));
            }
            if order.status == LabOrderStatus::Cancelled {
                return Err(HospitalError::Validation(format!(
                    "lab order {order_id} is cancelled"
                )));
            }
            encounter_id.get_or_insert(order.encounter_id);
            test_code.get_or_insert(order.test_code);
        }

        let status = input.status.unwrap_or(ReportStatus::Registered);
        if status == ReportStatus::Cancelled || status == ReportStatus::Amended {
            return Err(HospitalError::Validation(format!(
                "a diagnostic report cannot be filed as '{status}'"
            )));
        }

        let now = ctx.now();
        let report = tx
            .write(&self.tables.reports)
            .create(|id| DiagnosticReport {
                id,
                patient_id: input.patient_id,
                encounter_id,
                lab_order_id: input.lab_order_id,
                test_code,
                status,
                conclusion: optional_text(input.conclusion),
                issued_at: status.is_released().then_some(now),
                invoice_id: None,
            })
            .summary();
        if report.status.is_released() {
            self.complete_order(tx, report.lab_order_id);
        }

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            report_id = %report.id,
            patient_id = %report.patient_id,
            status = %report.status,
            "Diagnostic report filed"
        );
        Ok(report)
    }

    /// Advances a report, optionally replacing its conclusion
    pub async fn update_report_status(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: DiagnosticReportId,
        to: ReportStatus,
        conclusion: Option<String>,
    ) -> Result<DiagnosticReportSummary> {
        let report = tx
            .write(&self.tables.reports)
            .get_mut(id.value())
            .ok_or_else(|| HospitalError::not_found("diagnostic report", "report_id", id))?;
        let from = report.status;
        report.set_status(to, ctx.now())?;
        if let Some(conclusion) = optional_text(conclusion) {
            report.conclusion = Some(conclusion);
        }
        let report = report.summary();
        if to.is_released() {
            self.complete_order(tx, report.lab_order_id);
        }

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            report_id = %id,
            from = %from,
            to = %to,
            "Diagnostic report status changed"
        );
        Ok(report)
    }

    /// Binds released reports to an invoice; all or nothing
    pub async fn mark_reports_billed(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        ids: &[DiagnosticReportId],
        invoice_id: InvoiceId,
    ) -> Result<()> {
        let reports = tx.write(&self.tables.reports);
        for id in ids {
            let report = reports
                .get(id.value())
                .ok_or_else(|| HospitalError::not_found("diagnostic report", "report_id", id))?;
            if !report.status.is_released() {
                return Err(HospitalError::Conflict(format!(
                    "diagnostic report {id} is {}",
                    report.status
                )));
            }
            if let Some(existing) = report.invoice_id {
                return Err(HospitalError::Conflict(format!(
                    "diagnostic report {id} is already billed on invoice {existing}"
                )));
            }
        }
        for id in ids {
            if let Some(report) = reports.get_mut(id.value()) {
                report.invoice_id = Some(invoice_id);
            }
        }

        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice_id,
            reports = ids.len(),
            "Diagnostic reports marked billed"
        );
        Ok(())
    }

    pub async fn release_billing(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        invoice_id: InvoiceId,
    ) -> Result<usize> {
        let mut released = 0;
        for report in tx.write(&self.tables.reports).values_mut() {
            if report.invoice_id == Some(invoice_id) {
                report.invoice_id = None;
                released += 1;
            }
        }

        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice_id,
            released,
            "Diagnostic report billing released"
        );
        Ok(released)
    }

    fn complete_order(&self, tx: &mut Transaction, order_id: Option<LabOrderId>) {
        let Some(order_id) = order_id else {
            return;
        };
        if let Some(order) = tx.write(&self.tables.orders).get_mut(order_id.value()) {
            if order.status == LabOrderStatus::Requested {
                order.status = LabOrderStatus::Completed;
            }
        }
    }
}
