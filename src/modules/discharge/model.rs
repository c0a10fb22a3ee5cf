//! Discharge records and the readiness checklist

use crate::domain::{DischargeId, EncounterId, PatientId, PractitionerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DischargeStatus {
    /// Opened automatically for an inpatient encounter
    Pending,
    InProgress,
    Completed,
}

impl DischargeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for DischargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the patient goes after discharge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Home,
    HomeWithCare,
    Transfer,
    SkilledNursing,
    AgainstMedicalAdvice,
    Deceased,
}

/// Gates that must all be set before a discharge is complete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargeRequirements {
    pub diagnosis_recorded: bool,
    pub signature_obtained: bool,
    pub medication_reconciled: bool,
    pub summary_written: bool,
    pub follow_up_scheduled: bool,
    /// Set only by finalization, once billing reports the encounter cleared
    pub billing_cleared: bool,
}

impl DischargeRequirements {
    fn gates(&self) -> [(&'static str, bool); 6] {
        [
            ("diagnosis_recorded", self.diagnosis_recorded),
            ("signature_obtained", self.signature_obtained),
            ("medication_reconciled", self.medication_reconciled),
            ("summary_written", self.summary_written),
            ("follow_up_scheduled", self.follow_up_scheduled),
            ("billing_cleared", self.billing_cleared),
        ]
    }

    pub fn is_ready(&self) -> bool {
        self.gates().iter().all(|(_, set)| *set)
    }

    /// Names of the unmet gates, in checklist order
    pub fn missing(&self) -> Vec<&'static str> {
        self.gates()
            .into_iter()
            .filter(|(_, set)| !set)
            .map(|(name, _)| name)
            .collect()
    }

    /// First unmet gate other than `billing_cleared`
    pub fn first_missing_clinical(&self) -> Option<&'static str> {
        self.missing()
            .into_iter()
            .find(|gate| *gate != "billing_cleared")
    }
}

/// Partial change to a discharge; `None` leaves a field as it is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DischargeUpdate {
    pub clinical_summary: Option<String>,
    pub disposition: Option<Disposition>,
    pub diagnosis_recorded: Option<bool>,
    pub signature_obtained: Option<bool>,
    pub medication_reconciled: Option<bool>,
    pub summary_written: Option<bool>,
    pub follow_up_scheduled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargeSummary {
    pub id: DischargeId,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub status: DischargeStatus,
    pub clinical_summary: Option<String>,
    pub disposition: Option<Disposition>,
    pub finalized_by: Option<PractitionerId>,
    pub initiated_at: Option<DateTime<Utc>>,
    pub discharged_at: Option<DateTime<Utc>>,
    pub requirements: DischargeRequirements,
}

#[derive(Debug, Clone)]
pub(super) struct Discharge {
    pub id: i64,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub status: DischargeStatus,
    pub clinical_summary: Option<String>,
    pub disposition: Option<Disposition>,
    pub finalized_by: Option<PractitionerId>,
    pub initiated_at: Option<DateTime<Utc>>,
    pub discharged_at: Option<DateTime<Utc>>,
}

impl Discharge {
    pub fn summary(&self, requirements: Option<&DischargeRequirements>) -> DischargeSummary {
        DischargeSummary {
            id: DischargeId::new(self.id),
            encounter_id: self.encounter_id,
            patient_id: self.patient_id,
            status: self.status,
            clinical_summary: self.clinical_summary.clone(),
            disposition: self.disposition,
            finalized_by: self.finalized_by,
            initiated_at: self.initiated_at,
            discharged_at: self.discharged_at,
            requirements: requirements.copied().unwrap_or_default(),
        }
    }
}
