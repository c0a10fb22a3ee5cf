//! Walkthrough command implementation
//!
//! Runs one inpatient stay end to end against the in-memory store:
//! registration, admission, care, billing, a blocked discharge, payment and
//! the completed discharge.

use crate::adapters::memory::MemorySequenceLedger;
use crate::config::{load_config, WardhavenConfig};
use crate::core::Hospital;
use crate::domain::{HospitalError, RequestContext, Result};
use crate::modules::admission::{EncounterClass, EncounterStatus, NewEncounter};
use crate::modules::discharge::{DischargeStatus, DischargeUpdate, Disposition};
use crate::modules::identity::{
    Gender, LocationKind, NewLocation, NewOrganization, NewPatient, NewPractitioner,
    OrganizationKind,
};
use crate::modules::laboratory::{NewDiagnosticReport, NewLabOrder, NewLabTest, ReportStatus};
use crate::modules::monitoring::NewObservation;
use crate::modules::pharmacy::{NewInventoryItem, NewMedicationOrder};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;

/// Arguments for the walkthrough command
#[derive(Args, Debug)]
pub struct WalkthroughArgs {
    /// Require the full discharge checklist, whatever the config says
    #[arg(long)]
    pub enforce_checklist: bool,
}

/// What the scenario produced
#[derive(Debug)]
pub struct WalkthroughReport {
    pub patient: String,
    pub encounter: String,
    pub invoice: String,
    pub invoice_total: Decimal,
    pub blocked_outstanding: Decimal,
    pub encounter_status: EncounterStatus,
    pub discharge_status: DischargeStatus,
}

impl WalkthroughArgs {
    /// Execute the walkthrough command
    ///
    /// A missing config file falls back to defaults; an invalid one is a
    /// configuration error.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = if Path::new(config_path).exists() {
            match load_config(config_path) {
                Ok(c) => c,
                Err(e) => {
                    println!("❌ Failed to load configuration file");
                    println!("   Error: {e}");
                    return Ok(2);
                }
            }
        } else {
            tracing::info!(config_path = %config_path, "No configuration file, using defaults");
            WardhavenConfig::default()
        };
        if self.enforce_checklist {
            config.discharge.enforce_checklist = true;
        }

        println!("🏥 Wardhaven walkthrough");
        println!();

        let hospital = Hospital::with_ledger(&config, Arc::new(MemorySequenceLedger::new()));
        let report = run_scenario(&hospital).await?;

        println!();
        println!("Summary:");
        println!("  Patient: {}", report.patient);
        println!("  Encounter: {} ({})", report.encounter, report.encounter_status);
        println!("  Invoice: {} totalling {}", report.invoice, report.invoice_total);
        println!(
            "  Discharge blocked with {} outstanding, then {}",
            report.blocked_outstanding, report.discharge_status
        );
        println!();
        Ok(0)
    }
}

/// Plays one inpatient stay through `hospital`
///
/// Fails unless the discharge is first refused for the unpaid invoice and
/// then completes once the invoice is settled.
pub async fn run_scenario(hospital: &Hospital) -> Result<WalkthroughReport> {
    let ctx = RequestContext::new().with_actor("walkthrough");

    let org = hospital
        .register_organization(
            &ctx,
            NewOrganization {
                name: "Wardhaven General".to_string(),
                kind: OrganizationKind::Hospital,
            },
        )
        .await?
        .record;
    let ward = hospital
        .register_location(
            &ctx,
            NewLocation {
                organization_id: org.id,
                name: "Ward 4B".to_string(),
                kind: LocationKind::Ward,
            },
        )
        .await?
        .record;
    let doctor = hospital
        .register_practitioner(
            &ctx,
            NewPractitioner {
                first_name: "Amara".to_string(),
                last_name: "Okafor".to_string(),
                licence_number: Some("GMC-7012345".to_string()),
                qualification: Some("MBBS".to_string()),
            },
        )
        .await?
        .record;
    let birth_date = NaiveDate::from_ymd_opt(1958, 6, 2)
        .ok_or_else(|| HospitalError::Validation("invalid birth date".to_string()))?;
    let patient = hospital
        .register_patient(
            &ctx,
            NewPatient {
                first_name: "Tomasz".to_string(),
                last_name: "Wiśniewski".to_string(),
                birth_date,
                gender: Gender::Male,
                phone: None,
            },
        )
        .await?
        .record;
    println!("✅ Registered patient {}", patient.external_id);

    let encounter = hospital
        .admit(
            &ctx,
            NewEncounter {
                patient_external_id: patient.external_id.clone(),
                class: EncounterClass::Inpatient,
                status: Some(EncounterStatus::InProgress),
                practitioner_id: Some(doctor.id),
                location_id: Some(ward.id),
                organization_id: Some(org.id),
                reason: Some("Community-acquired pneumonia".to_string()),
            },
        )
        .await?;
    let pending = hospital
        .discharge
        .access
        .get_encounter_discharge(encounter.id)
        .await
        .ok_or_else(|| {
            HospitalError::Other("admission did not open a pending discharge".to_string())
        })?;
    println!(
        "✅ Admitted {} (discharge #{} {})",
        encounter.external_id, pending.id, pending.status
    );

    hospital
        .record_observation(
            &ctx,
            NewObservation {
                encounter_id: encounter.id,
                code: "8310-5".to_string(),
                value: Decimal::new(384, 1),
                unit: "Cel".to_string(),
                status: None,
                observed_at: None,
            },
        )
        .await?;

    hospital
        .add_catalog_item(
            &ctx,
            NewInventoryItem {
                code: "AMOX500".to_string(),
                name: "Amoxicillin 500 mg capsule".to_string(),
                unit_cost: Decimal::new(1000, 2),
                currency: None,
                quantity_on_hand: 200,
            },
        )
        .await?;
    let order = hospital
        .prescribe(
            &ctx,
            NewMedicationOrder {
                encounter_id: encounter.id,
                item_code: "AMOX500".to_string(),
                quantity: 5,
                prescriber_id: Some(doctor.id),
                instructions: Some("One capsule three times daily".to_string()),
            },
        )
        .await?;
    hospital.dispense(&ctx, order.id).await?;
    println!("✅ Dispensed {} × {}", order.quantity, order.item_code);

    hospital
        .add_lab_test(
            &ctx,
            NewLabTest {
                code: "CBC".to_string(),
                name: "Complete blood count".to_string(),
                base_price: Decimal::new(2500, 2),
                currency: None,
            },
        )
        .await?;
    let lab_order = hospital
        .order_lab_test(
            &ctx,
            NewLabOrder {
                encounter_id: encounter.id,
                test_code: "CBC".to_string(),
                requester_id: Some(doctor.id),
            },
        )
        .await?;
    hospital
        .file_report(
            &ctx,
            NewDiagnosticReport {
                patient_id: patient.id,
                encounter_id: None,
                lab_order_id: Some(lab_order.id),
                test_code: None,
                status: Some(ReportStatus::Final),
                conclusion: Some("Raised white cell count".to_string()),
            },
        )
        .await?;
    println!("✅ Filed final CBC report");

    let discharge = hospital
        .initiate_discharge(&ctx, encounter.id, patient.id)
        .await?;
    hospital
        .update_discharge(
            &ctx,
            discharge.id,
            DischargeUpdate {
                clinical_summary: Some("Treated with oral amoxicillin; afebrile 48h".to_string()),
                disposition: Some(Disposition::Home),
                diagnosis_recorded: Some(true),
                signature_obtained: Some(true),
                medication_reconciled: Some(true),
                follow_up_scheduled: Some(true),
                ..Default::default()
            },
        )
        .await?;

    let draft = hospital
        .generate_draft_invoice(&ctx, encounter.id, org.id)
        .await?;
    let invoice = hospital.issue_invoice(&ctx, draft.invoice.id).await?;
    println!(
        "✅ Issued {} with {} lines, total {} {}",
        invoice.external_id, draft.line_count, invoice.total_net, invoice.currency
    );

    let blocked_outstanding = match hospital
        .complete_discharge(&ctx, discharge.id, doctor.id)
        .await
    {
        Err(HospitalError::FinancialClearanceRequired { outstanding, .. }) => {
            println!("⛔ Discharge refused: {outstanding} outstanding");
            outstanding
        }
        Err(e) => return Err(e),
        Ok(_) => {
            return Err(HospitalError::Other(
                "discharge completed with an unpaid invoice".to_string(),
            ))
        }
    };

    let settled = hospital
        .record_payment(&ctx, invoice.id, invoice.outstanding())
        .await?;
    println!("✅ Payment recorded, invoice {}", settled.status);

    let completed = hospital
        .complete_discharge(&ctx, discharge.id, doctor.id)
        .await?;
    println!(
        "✅ Discharged; encounter {}",
        completed.encounter.status
    );

    Ok(WalkthroughReport {
        patient: patient.external_id,
        encounter: encounter.external_id,
        invoice: invoice.external_id,
        invoice_total: invoice.total_net,
        blocked_outstanding,
        encounter_status: completed.encounter.status,
        discharge_status: completed.discharge.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_scenario_blocks_then_completes_discharge() {
        let config = WardhavenConfig::default();
        let hospital = Hospital::with_ledger(&config, Arc::new(MemorySequenceLedger::new()));

        let report = run_scenario(&hospital).await.unwrap();

        // 5 × 10.00 + 25.00
        assert_eq!(report.invoice_total, dec!(75.00));
        assert_eq!(report.blocked_outstanding, dec!(75.00));
        assert_eq!(report.encounter_status, EncounterStatus::Finished);
        assert_eq!(report.discharge_status, DischargeStatus::Completed);
        assert!(report.patient.starts_with("WAH-"));
        assert!(report.invoice.starts_with("INV-"));
    }

    #[tokio::test]
    async fn test_scenario_satisfies_enforced_checklist() {
        let mut config = WardhavenConfig::default();
        config.discharge.enforce_checklist = true;
        let hospital = Hospital::with_ledger(&config, Arc::new(MemorySequenceLedger::new()));

        let report = run_scenario(&hospital).await.unwrap();
        assert_eq!(report.discharge_status, DischargeStatus::Completed);
    }

    #[tokio::test]
    async fn test_execute_without_config_file_uses_defaults() {
        let args = WalkthroughArgs {
            enforce_checklist: false,
        };
        let code = args.execute("/nonexistent/wardhaven.toml").await.unwrap();
        assert_eq!(code, 0);
    }
}
