//! Identity records and the DTOs other modules see

use crate::domain::validate::match_key;
use crate::domain::{LocationId, OrganizationId, PatientId, PractitionerId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Organization kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrganizationKind {
    #[default]
    Hospital,
    Clinic,
    Department,
    Insurer,
    Other,
}

/// Location kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LocationKind {
    #[default]
    Ward,
    Room,
    Bed,
    Clinic,
    Theatre,
    Other,
}

/// Administrative gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    #[serde(default)]
    pub kind: OrganizationKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLocation {
    pub organization_id: OrganizationId,
    pub name: String,
    #[serde(default)]
    pub kind: LocationKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPractitioner {
    pub first_name: String,
    pub last_name: String,
    pub licence_number: Option<String>,
    pub qualification: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub gender: Gender,
    pub phone: Option<String>,
}

/// Result of a create-with-deduplication write
///
/// `created` is `false` when an existing record matched and was returned instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration<T> {
    pub record: T,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    pub id: OrganizationId,
    pub name: String,
    pub kind: OrganizationKind,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub id: LocationId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub kind: LocationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PractitionerSummary {
    pub id: PractitionerId,
    pub display_name: String,
    pub licence_number: Option<String>,
    pub qualification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: PatientId,
    /// Registry number, e.g. `WAH-2026-00001`
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl PatientSummary {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub(super) struct Organization {
    pub id: i64,
    pub name: String,
    pub kind: OrganizationKind,
    pub active: bool,
}

impl Organization {
    pub fn summary(&self) -> OrganizationSummary {
        OrganizationSummary {
            id: OrganizationId::new(self.id),
            name: self.name.clone(),
            kind: self.kind,
            active: self.active,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Location {
    pub id: i64,
    pub organization_id: OrganizationId,
    pub name: String,
    pub kind: LocationKind,
}

impl Location {
    pub fn summary(&self) -> LocationSummary {
        LocationSummary {
            id: LocationId::new(self.id),
            organization_id: self.organization_id,
            name: self.name.clone(),
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Practitioner {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub licence_number: Option<String>,
    pub qualification: Option<String>,
}

impl Practitioner {
    /// Licence number when known, otherwise the full name
    pub fn dedup_key(&self) -> String {
        practitioner_key(
            &self.first_name,
            &self.last_name,
            self.licence_number.as_deref(),
        )
    }

    pub fn summary(&self) -> PractitionerSummary {
        PractitionerSummary {
            id: PractitionerId::new(self.id),
            display_name: format!("{} {}", self.first_name, self.last_name),
            licence_number: self.licence_number.clone(),
            qualification: self.qualification.clone(),
        }
    }
}

pub(super) fn practitioner_key(first: &str, last: &str, licence: Option<&str>) -> String {
    match licence {
        Some(licence) => format!("licence:{}", match_key(licence)),
        None => format!("name:{}|{}", match_key(first), match_key(last)),
    }
}

#[derive(Debug, Clone)]
pub(super) struct Patient {
    pub id: i64,
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl Patient {
    pub fn matches(&self, first: &str, last: &str, birth_date: NaiveDate) -> bool {
        self.birth_date == birth_date
            && match_key(&self.first_name) == match_key(first)
            && match_key(&self.last_name) == match_key(last)
    }

    pub fn summary(&self) -> PatientSummary {
        PatientSummary {
            id: PatientId::new(self.id),
            external_id: self.external_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birth_date: self.birth_date,
            gender: self.gender,
            phone: self.phone.clone(),
            registered_at: self.registered_at,
        }
    }
}
