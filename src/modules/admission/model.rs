//! Encounter and procedure records, the encounter state machine

use crate::domain::{
    EncounterId, HospitalError, LocationId, OrganizationId, PatientId, PractitionerId,
    ProcedureId, Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encounter class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncounterClass {
    Inpatient,
    Outpatient,
    Emergency,
    Virtual,
}

impl EncounterClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inpatient => "inpatient",
            Self::Outpatient => "outpatient",
            Self::Emergency => "emergency",
            Self::Virtual => "virtual",
        }
    }
}

impl fmt::Display for EncounterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encounter lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterStatus {
    #[serde(rename = "planned")]
    Planned,
    #[serde(rename = "arrived")]
    Arrived,
    #[serde(rename = "triaged")]
    Triaged,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "onleave")]
    OnLeave,
    #[serde(rename = "finished")]
    Finished,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "entered-in-error")]
    EnteredInError,
    #[serde(rename = "unknown")]
    Unknown,
}

impl EncounterStatus {
    pub const ALL: [EncounterStatus; 9] = [
        Self::Planned,
        Self::Arrived,
        Self::Triaged,
        Self::InProgress,
        Self::OnLeave,
        Self::Finished,
        Self::Cancelled,
        Self::EnteredInError,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Arrived => "arrived",
            Self::Triaged => "triaged",
            Self::InProgress => "in-progress",
            Self::OnLeave => "onleave",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
            Self::EnteredInError => "entered-in-error",
            Self::Unknown => "unknown",
        }
    }

    /// `finished`, `cancelled` and `entered-in-error` accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished | Self::Cancelled | Self::EnteredInError
        )
    }

    /// Statuses reachable in one step
    pub fn allowed_transitions(&self) -> &'static [EncounterStatus] {
        use EncounterStatus::*;
        match self {
            Planned => &[Arrived, Triaged, Cancelled],
            Arrived => &[Triaged, InProgress, Cancelled],
            Triaged => &[InProgress, Cancelled],
            InProgress => &[OnLeave, Finished, Cancelled],
            OnLeave => &[InProgress, Finished, Cancelled],
            Unknown => &[Planned, Arrived, Triaged, InProgress],
            Finished | Cancelled | EnteredInError => &[],
        }
    }

    pub fn can_transition_to(&self, to: EncounterStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

impl fmt::Display for EncounterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncounterStatus {
    type Err = HospitalError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HospitalError::Validation(format!("Unknown encounter status '{s}'")))
    }
}

/// Checks one step of the encounter state machine
///
/// # Errors
///
/// Returns `InvalidStateTransition` when `to` is not reachable from `from`.
pub fn validate_encounter_status_transition(
    from: EncounterStatus,
    to: EncounterStatus,
) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(HospitalError::transition("encounter", from, to))
    }
}

/// Request to open an encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEncounter {
    /// Patient registry number (`WAH-2026-00001`)
    pub patient_external_id: String,
    pub class: EncounterClass,
    /// Starting status, `planned` when omitted
    pub status: Option<EncounterStatus>,
    pub practitioner_id: Option<PractitionerId>,
    pub location_id: Option<LocationId>,
    pub organization_id: Option<OrganizationId>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformerInput {
    pub practitioner_id: PractitionerId,
    pub role: String,
}

/// Request to record a procedure
///
/// `patient_id` is optional: the procedure always takes the encounter's
/// patient, and a supplied value that differs is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProcedure {
    pub encounter_id: EncounterId,
    pub patient_id: Option<PatientId>,
    pub code: String,
    pub display: Option<String>,
    pub performed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub performers: Vec<PerformerInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSummary {
    pub id: EncounterId,
    /// `ENC-20260314-3FA2C1`
    pub external_id: String,
    pub patient_id: PatientId,
    pub class: EncounterClass,
    pub status: EncounterStatus,
    pub practitioner_id: Option<PractitionerId>,
    pub location_id: Option<LocationId>,
    pub organization_id: Option<OrganizationId>,
    pub reason: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

/// Encounter with names resolved through the identity registry
///
/// A reference that no longer resolves renders as a placeholder name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncounterOverview {
    pub encounter: EncounterSummary,
    pub patient_name: String,
    pub practitioner_name: String,
    pub location_name: Option<String>,
}

/// One recorded step of an encounter's lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterStatusChange {
    pub from: EncounterStatus,
    pub to: EncounterStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformerSummary {
    pub practitioner_id: PractitionerId,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureSummary {
    pub id: ProcedureId,
    /// `PROC-20260314-0B91DE`
    pub external_id: String,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub code: String,
    pub display: Option<String>,
    pub performed_at: DateTime<Utc>,
    pub performers: Vec<PerformerSummary>,
}

#[derive(Debug, Clone)]
pub(super) struct Encounter {
    pub id: i64,
    pub external_id: String,
    pub patient_id: PatientId,
    pub class: EncounterClass,
    pub status: EncounterStatus,
    pub practitioner_id: Option<PractitionerId>,
    pub location_id: Option<LocationId>,
    pub organization_id: Option<OrganizationId>,
    pub reason: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub status_history: Vec<EncounterStatusChange>,
}

impl Encounter {
    /// Moves to `to`, stamping the period boundaries
    pub fn apply_status(&mut self, to: EncounterStatus, at: DateTime<Utc>) -> Result<()> {
        validate_encounter_status_transition(self.status, to)?;
        if to == EncounterStatus::InProgress && self.period_start.is_none() {
            self.period_start = Some(at);
        }
        if to.is_terminal() {
            self.period_end = Some(at);
        }
        self.status_history.push(EncounterStatusChange {
            from: self.status,
            to,
            at,
        });
        self.status = to;
        Ok(())
    }

    pub fn summary(&self) -> EncounterSummary {
        EncounterSummary {
            id: EncounterId::new(self.id),
            external_id: self.external_id.clone(),
            patient_id: self.patient_id,
            class: self.class,
            status: self.status,
            practitioner_id: self.practitioner_id,
            location_id: self.location_id,
            organization_id: self.organization_id,
            reason: self.reason.clone(),
            period_start: self.period_start,
            period_end: self.period_end,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Procedure {
    pub id: i64,
    pub external_id: String,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub code: String,
    pub display: Option<String>,
    pub performed_at: DateTime<Utc>,
    pub performers: Vec<PerformerSummary>,
}

impl Procedure {
    pub fn summary(&self) -> ProcedureSummary {
        ProcedureSummary {
            id: ProcedureId::new(self.id),
            external_id: self.external_id.clone(),
            encounter_id: self.encounter_id,
            patient_id: self.patient_id,
            code: self.code.clone(),
            display: self.display.clone(),
            performed_at: self.performed_at,
            performers: self.performers.clone(),
        }
    }
}
