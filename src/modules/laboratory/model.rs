//! Lab test catalog, lab orders and diagnostic reports

use crate::domain::{
    DiagnosticReportId, EncounterId, HospitalError, InvoiceId, LabOrderId, PatientId,
    PractitionerId, Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabTest {
    pub code: String,
    pub name: String,
    pub base_price: Decimal,
    pub currency: Option<String>,
}

/// Price of one lab test, as billing sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPrice {
    pub code: String,
    pub name: String,
    pub base_price: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabOrderStatus {
    Requested,
    Completed,
    Cancelled,
}

impl LabOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for LabOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabOrder {
    pub encounter_id: EncounterId,
    pub test_code: String,
    pub requester_id: Option<PractitionerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabOrderSummary {
    pub id: LabOrderId,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub test_code: String,
    pub requester_id: Option<PractitionerId>,
    pub status: LabOrderStatus,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Registered,
    Preliminary,
    Final,
    Amended,
    Cancelled,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Preliminary => "preliminary",
            Self::Final => "final",
            Self::Amended => "amended",
            Self::Cancelled => "cancelled",
        }
    }

    /// `final` or `amended`: the report's result is released
    pub fn is_released(&self) -> bool {
        matches!(self, Self::Final | Self::Amended)
    }

    pub fn can_transition_to(&self, to: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, to),
            (Registered, Preliminary | Final | Cancelled)
                | (Preliminary, Final | Cancelled)
                | (Final, Amended | Cancelled)
                | (Amended, Amended | Cancelled)
        )
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to file a diagnostic report
///
/// The test code falls back to the lab order's when omitted. A report without
/// any test code is stored but never billed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiagnosticReport {
    pub patient_id: PatientId,
    pub encounter_id: Option<EncounterId>,
    pub lab_order_id: Option<LabOrderId>,
    pub test_code: Option<String>,
    /// `registered` when omitted
    pub status: Option<ReportStatus>,
    pub conclusion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReportSummary {
    pub id: DiagnosticReportId,
    pub patient_id: PatientId,
    pub encounter_id: Option<EncounterId>,
    pub lab_order_id: Option<LabOrderId>,
    pub test_code: Option<String>,
    pub status: ReportStatus,
    pub conclusion: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    /// Invoice this report is billed on, if any
    pub invoice_id: Option<InvoiceId>,
}

impl DiagnosticReportSummary {
    /// Released and not yet on an invoice
    pub fn is_billable(&self) -> bool {
        self.status.is_released() && self.invoice_id.is_none()
    }
}

#[derive(Debug, Clone)]
pub(super) struct LabTestDefinition {
    pub code: String,
    pub name: String,
    pub base_price: Decimal,
    pub currency: String,
}

impl LabTestDefinition {
    pub fn price(&self) -> TestPrice {
        TestPrice {
            code: self.code.clone(),
            name: self.name.clone(),
            base_price: self.base_price,
            currency: self.currency.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct LabOrder {
    pub id: i64,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub test_code: String,
    pub requester_id: Option<PractitionerId>,
    pub status: LabOrderStatus,
    pub requested_at: DateTime<Utc>,
}

impl LabOrder {
    pub fn summary(&self) -> LabOrderSummary {
        LabOrderSummary {
            id: LabOrderId::new(self.id),
            encounter_id: self.encounter_id,
            patient_id: self.patient_id,
            test_code: self.test_code.clone(),
            requester_id: self.requester_id,
            status: self.status,
            requested_at: self.requested_at,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct DiagnosticReport {
    pub id: i64,
    pub patient_id: PatientId,
    pub encounter_id: Option<EncounterId>,
    pub lab_order_id: Option<LabOrderId>,
    pub test_code: Option<String>,
    pub status: ReportStatus,
    pub conclusion: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub invoice_id: Option<InvoiceId>,
}

impl DiagnosticReport {
    /// Moves to `to`, stamping `issued_at` when the result is released
    pub fn set_status(&mut self, to: ReportStatus, at: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(HospitalError::transition("diagnostic report", self.status, to));
        }
        if to == ReportStatus::Cancelled {
            if let Some(invoice) = self.invoice_id {
                return Err(HospitalError::Conflict(format!(
                    "diagnostic report {} is billed on invoice {invoice}",
                    self.id
                )));
            }
        }
        if to.is_released() {
            self.issued_at = Some(at);
        }
        self.status = to;
        Ok(())
    }

    pub fn summary(&self) -> DiagnosticReportSummary {
        DiagnosticReportSummary {
            id: DiagnosticReportId::new(self.id),
            patient_id: self.patient_id,
            encounter_id: self.encounter_id,
            lab_order_id: self.lab_order_id,
            test_code: self.test_code.clone(),
            status: self.status,
            conclusion: self.conclusion.clone(),
            issued_at: self.issued_at,
            invoice_id: self.invoice_id,
        }
    }
}

/// Test code comparison key
pub(super) fn test_key(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use ReportStatus::*;

    #[test_case(Registered, Final, true)]
    #[test_case(Preliminary, Final, true)]
    #[test_case(Final, Amended, true)]
    #[test_case(Amended, Amended, true)]
    #[test_case(Final, Preliminary, false)]
    #[test_case(Cancelled, Final, false)]
    #[test_case(Registered, Amended, false)]
    fn test_report_transitions(from: ReportStatus, to: ReportStatus, ok: bool) {
        assert_eq!(from.can_transition_to(to), ok);
    }

    #[test]
    fn test_only_released_unbilled_reports_are_billable() {
        let mut report = DiagnosticReportSummary {
            id: DiagnosticReportId::new(1),
            patient_id: PatientId::new(1),
            encounter_id: None,
            lab_order_id: None,
            test_code: Some("CBC".to_string()),
            status: Preliminary,
            conclusion: None,
            issued_at: None,
            invoice_id: None,
        };
        assert!(!report.is_billable());
        report.status = Amended;
        assert!(report.is_billable());
        report.invoice_id = Some(InvoiceId::new(3));
        assert!(!report.is_billable());
    }
}
