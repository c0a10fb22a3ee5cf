//! Observation records

use crate::domain::{EncounterId, HospitalError, ObservationId, PatientId, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationStatus {
    Preliminary,
    Final,
    EnteredInError,
}

impl ObservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preliminary => "preliminary",
            Self::Final => "final",
            Self::EnteredInError => "entered-in-error",
        }
    }

    /// `preliminary -> final`, and either of them `-> entered-in-error`
    pub fn can_transition_to(&self, to: ObservationStatus) -> bool {
        matches!(
            (self, to),
            (Self::Preliminary, Self::Final)
                | (Self::Preliminary, Self::EnteredInError)
                | (Self::Final, Self::EnteredInError)
        )
    }
}

impl fmt::Display for ObservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to record a vital sign or other measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObservation {
    pub encounter_id: EncounterId,
    /// LOINC or local code, e.g. `8310-5` (body temperature)
    pub code: String,
    pub value: Decimal,
    pub unit: String,
    /// `final` when omitted
    pub status: Option<ObservationStatus>,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSummary {
    pub id: ObservationId,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub code: String,
    pub value: Decimal,
    pub unit: String,
    pub status: ObservationStatus,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(super) struct Observation {
    pub id: i64,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub code: String,
    pub value: Decimal,
    pub unit: String,
    pub status: ObservationStatus,
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn set_status(&mut self, to: ObservationStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(HospitalError::transition("observation", self.status, to));
        }
        self.status = to;
        Ok(())
    }

    pub fn summary(&self) -> ObservationSummary {
        ObservationSummary {
            id: ObservationId::new(self.id),
            encounter_id: self.encounter_id,
            patient_id: self.patient_id,
            code: self.code.clone(),
            value: self.value,
            unit: self.unit.clone(),
            status: self.status,
            observed_at: self.observed_at,
        }
    }
}
