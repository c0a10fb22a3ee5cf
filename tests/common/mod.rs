//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rust_decimal::Decimal;
use std::sync::Arc;
use wardhaven::adapters::memory::MemorySequenceLedger;
use wardhaven::config::WardhavenConfig;
use wardhaven::core::Hospital;
use wardhaven::domain::RequestContext;
use wardhaven::modules::admission::{EncounterClass, EncounterStatus, EncounterSummary, NewEncounter};
use wardhaven::modules::identity::{
    NewOrganization, NewPatient, NewPractitioner, OrganizationKind, OrganizationSummary,
    PatientSummary, PractitionerSummary,
};
use wardhaven::modules::pharmacy::NewInventoryItem;

/// Request context pinned to 2026-03-14 09:30 UTC
pub fn ctx() -> RequestContext {
    RequestContext::at(Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()).with_actor("tests")
}

pub fn hospital(config: &WardhavenConfig) -> Hospital {
    Hospital::with_ledger(config, Arc::new(MemorySequenceLedger::new()))
}

/// A patient with generated names; the birth date keeps registrations distinct
pub fn fake_patient(birth_date: NaiveDate) -> NewPatient {
    NewPatient {
        first_name: FirstName().fake(),
        last_name: LastName().fake(),
        birth_date,
        gender: Default::default(),
        phone: None,
    }
}

pub fn birth_date(day_offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Days::new(day_offset as u64)
}

/// A hospital with one organization, practitioner and patient registered
pub struct Ward {
    pub hospital: Hospital,
    pub org: OrganizationSummary,
    pub doctor: PractitionerSummary,
    pub patient: PatientSummary,
}

impl Ward {
    pub async fn new() -> Self {
        Self::with_config(&WardhavenConfig::default()).await
    }

    pub async fn with_config(config: &WardhavenConfig) -> Self {
        let hospital = hospital(config);
        let ctx = ctx();
        let org = hospital
            .register_organization(
                &ctx,
                NewOrganization {
                    name: "Wardhaven General".to_string(),
                    kind: OrganizationKind::Hospital,
                },
            )
            .await
            .unwrap()
            .record;
        let doctor = hospital
            .register_practitioner(
                &ctx,
                NewPractitioner {
                    first_name: FirstName().fake(),
                    last_name: LastName().fake(),
                    licence_number: None,
                    qualification: Some("MD".to_string()),
                },
            )
            .await
            .unwrap()
            .record;
        let patient = hospital
            .register_patient(&ctx, fake_patient(birth_date(0)))
            .await
            .unwrap()
            .record;
        Self {
            hospital,
            org,
            doctor,
            patient,
        }
    }

    pub async fn admit(&self, class: EncounterClass) -> EncounterSummary {
        self.hospital
            .admit(
                &ctx(),
                NewEncounter {
                    patient_external_id: self.patient.external_id.clone(),
                    class,
                    status: Some(EncounterStatus::InProgress),
                    practitioner_id: Some(self.doctor.id),
                    location_id: None,
                    organization_id: Some(self.org.id),
                    reason: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn stock(&self, code: &str, unit_cost: Decimal) {
        self.hospital
            .add_catalog_item(
                &ctx(),
                NewInventoryItem {
                    code: code.to_string(),
                    name: format!("{code} (test stock)"),
                    unit_cost,
                    currency: None,
                    quantity_on_hand: 1000,
                },
            )
            .await
            .unwrap();
    }
}
