//! Integration tests for discharge completion and financial clearance

mod common;

use common::{birth_date, ctx, fake_patient, Ward};
use rust_decimal_macros::dec;
use wardhaven::config::WardhavenConfig;
use wardhaven::core::events::DomainEvent;
use wardhaven::domain::HospitalError;
use wardhaven::modules::admission::{
    EncounterClass, EncounterStatus, EncounterSummary, NewEncounter,
};
use wardhaven::modules::billing::InvoiceStatus;
use wardhaven::modules::discharge::{DischargeStatus, DischargeSummary, DischargeUpdate, Disposition};
use wardhaven::modules::pharmacy::NewMedicationOrder;

/// Admits an inpatient and starts the discharge
async fn initiated(ward: &Ward) -> (EncounterSummary, DischargeSummary) {
    let stay = ward.admit(EncounterClass::Inpatient).await;
    let discharge = ward
        .hospital
        .initiate_discharge(&ctx(), stay.id, ward.patient.id)
        .await
        .unwrap();
    (stay, discharge)
}

/// Bills five units at 10.00 and issues the invoice
async fn issue_bill(ward: &Ward, stay: &EncounterSummary) -> wardhaven::modules::billing::InvoiceSummary {
    ward.stock("PARA500", dec!(10.00)).await;
    ward.hospital
        .prescribe(
            &ctx(),
            NewMedicationOrder {
                encounter_id: stay.id,
                item_code: "PARA500".to_string(),
                quantity: 5,
                prescriber_id: Some(ward.doctor.id),
                instructions: None,
            },
        )
        .await
        .unwrap();
    let draft = ward
        .hospital
        .generate_draft_invoice(&ctx(), stay.id, ward.org.id)
        .await
        .unwrap();
    ward.hospital
        .issue_invoice(&ctx(), draft.invoice.id)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_inpatient_admission_opens_one_pending_discharge() {
    let ward = Ward::new().await;
    let stay = ward.admit(EncounterClass::Inpatient).await;

    let pending = ward
        .hospital
        .discharge
        .access
        .get_encounter_discharge(stay.id)
        .await
        .unwrap();
    assert_eq!(pending.status, DischargeStatus::Pending);
    assert_eq!(pending.patient_id, ward.patient.id);

    // Redelivery of the same event
    let event = DomainEvent::EncounterCreated {
        encounter_id: stay.id,
        patient_id: stay.patient_id,
        class: stay.class,
    };
    ward.hospital
        .orchestrator()
        .dispatch(&ctx(), &[event.clone(), event])
        .await
        .unwrap();

    let all = ward
        .hospital
        .discharge
        .access
        .list_patient_discharges(ward.patient.id)
        .await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, pending.id);
}

#[tokio::test]
async fn test_admission_event_handled_in_the_admitting_transaction() {
    let ward = Ward::new().await;
    let ctx = ctx();
    let mut tx = ward.hospital.database().begin().await;

    // patient, encounter and discharge all staged in one unit of work
    let patient = ward
        .hospital
        .identity
        .service
        .register_patient(&ctx, &mut tx, fake_patient(birth_date(40)))
        .await
        .unwrap()
        .record;
    let admitted = ward
        .hospital
        .admission
        .service
        .create_encounter(
            &ctx,
            &mut tx,
            NewEncounter {
                patient_external_id: patient.external_id.clone(),
                class: EncounterClass::Inpatient,
                status: Some(EncounterStatus::InProgress),
                practitioner_id: Some(ward.doctor.id),
                location_id: None,
                organization_id: None,
                reason: None,
            },
        )
        .await
        .unwrap();
    for event in &admitted.events {
        ward.hospital
            .orchestrator()
            .handle(&ctx, &mut tx, event)
            .await
            .unwrap();
    }
    tx.commit();

    let pending = ward
        .hospital
        .discharge
        .access
        .get_encounter_discharge(admitted.encounter.id)
        .await
        .unwrap();
    assert_eq!(pending.status, DischargeStatus::Pending);
    assert_eq!(pending.patient_id, patient.id);
}

#[tokio::test]
async fn test_outpatient_admission_opens_no_discharge() {
    let ward = Ward::new().await;
    let visit = ward.admit(EncounterClass::Outpatient).await;
    assert!(ward
        .hospital
        .discharge
        .access
        .get_encounter_discharge(visit.id)
        .await
        .is_none());
}

#[tokio::test]
async fn test_outstanding_balance_blocks_completion() {
    let ward = Ward::new().await;
    let (stay, discharge) = initiated(&ward).await;
    assert_eq!(discharge.status, DischargeStatus::InProgress);
    issue_bill(&ward, &stay).await;

    let err = ward
        .hospital
        .complete_discharge(&ctx(), discharge.id, ward.doctor.id)
        .await
        .unwrap_err();
    match err {
        HospitalError::FinancialClearanceRequired {
            encounter_id,
            outstanding,
        } => {
            assert_eq!(encounter_id, stay.id.value());
            assert_eq!(outstanding, dec!(50.00));
        }
        other => panic!("expected FinancialClearanceRequired, got {other:?}"),
    }

    let unchanged = ward
        .hospital
        .discharge
        .access
        .get_discharge_summary(discharge.id)
        .await
        .unwrap();
    assert_eq!(unchanged.status, DischargeStatus::InProgress);
    assert!(unchanged.discharged_at.is_none());
    let encounter = ward
        .hospital
        .admission
        .access
        .get_encounter_summary(stay.id)
        .await
        .unwrap();
    assert_eq!(encounter.status, EncounterStatus::InProgress);
}

#[tokio::test]
async fn test_partial_payment_still_blocks_and_full_payment_clears() {
    let ward = Ward::new().await;
    let (stay, discharge) = initiated(&ward).await;
    let invoice = issue_bill(&ward, &stay).await;

    ward.hospital
        .record_payment(&ctx(), invoice.id, dec!(20.00))
        .await
        .unwrap();
    let err = ward
        .hospital
        .complete_discharge(&ctx(), discharge.id, ward.doctor.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HospitalError::FinancialClearanceRequired { outstanding, .. } if outstanding == dec!(30.00)
    ));

    let paid = ward
        .hospital
        .record_payment(&ctx(), invoice.id, dec!(30.00))
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Balanced);

    let done = ward
        .hospital
        .complete_discharge(&ctx(), discharge.id, ward.doctor.id)
        .await
        .unwrap();
    assert_eq!(done.discharge.status, DischargeStatus::Completed);
    assert!(done.discharge.requirements.billing_cleared);
    assert_eq!(done.discharge.finalized_by, Some(ward.doctor.id));
    assert_eq!(done.encounter.status, EncounterStatus::Finished);
    assert!(done.encounter.period_end.is_some());
}

#[tokio::test]
async fn test_zero_balance_completes_once() {
    let ward = Ward::new().await;
    let (_, discharge) = initiated(&ward).await;

    let done = ward
        .hospital
        .complete_discharge(&ctx(), discharge.id, ward.doctor.id)
        .await
        .unwrap();
    assert_eq!(done.discharge.status, DischargeStatus::Completed);

    let err = ward
        .hospital
        .complete_discharge(&ctx(), discharge.id, ward.doctor.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HospitalError::InvalidStateTransition { .. }));

    let err = ward
        .hospital
        .update_discharge(
            &ctx(),
            discharge.id,
            DischargeUpdate {
                clinical_summary: Some("late note".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HospitalError::Conflict(_)));
}

#[tokio::test]
async fn test_pending_discharge_cannot_be_completed() {
    let ward = Ward::new().await;
    let stay = ward.admit(EncounterClass::Inpatient).await;
    let pending = ward
        .hospital
        .discharge
        .access
        .get_encounter_discharge(stay.id)
        .await
        .unwrap();

    let err = ward
        .hospital
        .complete_discharge(&ctx(), pending.id, ward.doctor.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HospitalError::InvalidStateTransition { .. }));
}

#[tokio::test]
async fn test_enforced_checklist_names_first_missing_gate() {
    let mut config = WardhavenConfig::default();
    config.discharge.enforce_checklist = true;
    let ward = Ward::with_config(&config).await;
    let (_, discharge) = initiated(&ward).await;

    ward.hospital
        .update_discharge(
            &ctx(),
            discharge.id,
            DischargeUpdate {
                diagnosis_recorded: Some(true),
                signature_obtained: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = ward
        .hospital
        .complete_discharge(&ctx(), discharge.id, ward.doctor.id)
        .await
        .unwrap_err();
    match err {
        HospitalError::MissingRequiredField { field } => assert_eq!(field, "medication_reconciled"),
        other => panic!("expected MissingRequiredField, got {other:?}"),
    }

    let updated = ward
        .hospital
        .update_discharge(
            &ctx(),
            discharge.id,
            DischargeUpdate {
                clinical_summary: Some("Recovered well".to_string()),
                disposition: Some(Disposition::HomeWithCare),
                medication_reconciled: Some(true),
                follow_up_scheduled: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.requirements.summary_written);
    assert_eq!(updated.requirements.missing(), vec!["billing_cleared"]);

    let done = ward
        .hospital
        .complete_discharge(&ctx(), discharge.id, ward.doctor.id)
        .await
        .unwrap();
    assert!(done.discharge.requirements.is_ready());
}

#[tokio::test]
async fn test_cancelled_invoice_no_longer_blocks() {
    let ward = Ward::new().await;
    let (stay, discharge) = initiated(&ward).await;
    let invoice = issue_bill(&ward, &stay).await;

    ward.hospital
        .cancel_invoice(&ctx(), invoice.id)
        .await
        .unwrap();
    let balance = ward
        .hospital
        .billing
        .access
        .get_encounter_balance(stay.id)
        .await;
    assert_eq!(balance.outstanding, dec!(0));
    assert!(balance.is_cleared());

    ward.hospital
        .complete_discharge(&ctx(), discharge.id, ward.doctor.id)
        .await
        .unwrap();
}
