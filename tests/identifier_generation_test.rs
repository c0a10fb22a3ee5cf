//! Integration tests for registry numbers and dated identifiers

mod common;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{birth_date, ctx, fake_patient, Ward};
use regex::Regex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wardhaven::adapters::database::{NextIdentifier, SequenceLedger};
use wardhaven::adapters::memory::MemorySequenceLedger;
use wardhaven::config::WardhavenConfig;
use wardhaven::core::Hospital;
use wardhaven::domain::{HospitalError, OrganizationId, RequestContext, Result};
use wardhaven::modules::admission::EncounterClass;

/// Another process claims the first identifier of the year between our read
/// and our insert
struct RacingLedger {
    inner: MemorySequenceLedger,
    raced: AtomicBool,
}

#[async_trait]
impl SequenceLedger for RacingLedger {
    async fn reserve(&self, partition: &str, next: NextIdentifier<'_>) -> Result<String> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let candidate = next(None)?;
            self.inner.record(candidate.clone()).await;
            return Err(HospitalError::DuplicateIdentifier(candidate));
        }
        self.inner.reserve(partition, next).await
    }

    async fn issued_count(&self, partition: &str) -> Result<usize> {
        self.inner.issued_count(partition).await
    }

    fn backend_name(&self) -> &str {
        "racing"
    }
}

#[tokio::test]
async fn test_patients_numbered_from_one_each_year() {
    let ward = Ward::new().await;
    assert_eq!(ward.patient.external_id, "WAH-2026-00001");

    let second = ward
        .hospital
        .register_patient(&ctx(), fake_patient(birth_date(1)))
        .await
        .unwrap();
    assert!(second.created);
    assert_eq!(second.record.external_id, "WAH-2026-00002");

    let next_year = RequestContext::at(Utc.with_ymd_and_hms(2027, 1, 1, 0, 5, 0).unwrap());
    let third = ward
        .hospital
        .register_patient(&next_year, fake_patient(birth_date(2)))
        .await
        .unwrap();
    assert_eq!(third.record.external_id, "WAH-2027-00001");
}

#[tokio::test]
async fn test_matching_registration_consumes_no_number() {
    let ward = Ward::new().await;
    let again = ward
        .hospital
        .register_patient(
            &ctx(),
            wardhaven::modules::identity::NewPatient {
                first_name: ward.patient.first_name.clone(),
                last_name: ward.patient.last_name.clone(),
                birth_date: ward.patient.birth_date,
                gender: Default::default(),
                phone: None,
            },
        )
        .await
        .unwrap();
    assert!(!again.created);
    assert_eq!(again.record.id, ward.patient.id);

    let next = ward
        .hospital
        .register_patient(&ctx(), fake_patient(birth_date(9)))
        .await
        .unwrap();
    assert_eq!(next.record.external_id, "WAH-2026-00002");
}

#[tokio::test]
async fn test_first_of_year_collision_resolves_to_distinct_numbers() {
    let ledger = Arc::new(RacingLedger {
        inner: MemorySequenceLedger::new(),
        raced: AtomicBool::new(false),
    });
    let hospital = Hospital::with_ledger(&WardhavenConfig::default(), ledger.clone());

    let first = hospital
        .register_patient(&ctx(), fake_patient(birth_date(0)))
        .await
        .unwrap();
    let second = hospital
        .register_patient(&ctx(), fake_patient(birth_date(1)))
        .await
        .unwrap();

    // 00001 went to the racing writer
    assert_eq!(first.record.external_id, "WAH-2026-00002");
    assert_eq!(second.record.external_id, "WAH-2026-00003");
    assert_eq!(ledger.issued_count("WAH-2026-").await.unwrap(), 3);
}

#[tokio::test]
async fn test_encounter_identifiers_are_dated_and_unique() {
    let ward = Ward::new().await;
    let pattern = Regex::new(r"^ENC-\d{8}-[0-9A-F]{6}$").unwrap();

    let mut seen = HashSet::new();
    for _ in 0..25 {
        let encounter = ward.admit(EncounterClass::Outpatient).await;
        assert!(
            pattern.is_match(&encounter.external_id),
            "unexpected identifier {}",
            encounter.external_id
        );
        assert!(encounter.external_id.starts_with("ENC-20260314-"));
        assert!(seen.insert(encounter.external_id));
    }
}

#[tokio::test]
async fn test_rejected_invoice_consumes_no_number() {
    let ward = Ward::new().await;
    let encounter = ward.admit(EncounterClass::Outpatient).await;

    let err = ward
        .hospital
        .generate_draft_invoice(&ctx(), encounter.id, OrganizationId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, HospitalError::ReferencedEntityNotFound { .. }));

    let draft = ward
        .hospital
        .generate_draft_invoice(&ctx(), encounter.id, ward.org.id)
        .await
        .unwrap();
    assert_eq!(draft.invoice.external_id, "INV-2026-00001");
}
