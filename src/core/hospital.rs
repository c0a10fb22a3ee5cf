//! Wired hospital back-office
//!
//! [`Hospital`] builds every module against one record store and identifier
//! ledger, and runs each write as one request: begin a transaction, call the
//! owning service, commit on success. A rejected write is logged and its
//! transaction dropped, so it leaves no rows behind.
//!
//! Reads go straight to the modules' accessors (`hospital.billing.access`, …).
//!
//! # Example
//!
//! ```rust,no_run
//! use wardhaven::config::WardhavenConfig;
//! use wardhaven::core::Hospital;
//! use wardhaven::domain::RequestContext;
//! use wardhaven::modules::identity::NewOrganization;
//!
//! # async fn example() -> wardhaven::domain::Result<()> {
//! let hospital = Hospital::from_config(&WardhavenConfig::default()).await?;
//! let ctx = RequestContext::new().with_actor("registrar");
//! let org = hospital
//!     .register_organization(
//!         &ctx,
//!         NewOrganization {
//!             name: "St Brigid's General".to_string(),
//!             kind: Default::default(),
//!         },
//!     )
//!     .await?;
//! println!("{}", org.record.name);
//! # Ok(())
//! # }
//! ```

use crate::adapters::database::{create_sequence_ledger, SequenceLedger};
use crate::adapters::memory::Database;
use crate::config::WardhavenConfig;
use crate::core::identifiers::SequentialIdGenerator;
use crate::core::orchestrator::{CareOrchestrator, CompletedDischarge};
use crate::domain::{
    DiagnosticReportId, DischargeId, EncounterId, InvoiceId, LabOrderId, MedicationOrderId,
    ObservationId, OrganizationId, PatientId, PractitionerId, RequestContext, Result,
};
use crate::modules::admission::{
    AdmissionModule, EncounterStatus, EncounterSummary, NewEncounter, NewProcedure,
    ProcedureSummary,
};
use crate::modules::billing::{
    BillingModule, DraftInvoice, InvoiceLineSummary, InvoiceSummary, ManualLine,
};
use crate::modules::discharge::{DischargeModule, DischargeSummary, DischargeUpdate};
use crate::modules::identity::{
    IdentityModule, LocationSummary, NewLocation, NewOrganization, NewPatient, NewPractitioner,
    OrganizationSummary, PatientSummary, PractitionerSummary, Registration,
};
use crate::modules::laboratory::{
    DiagnosticReportSummary, LabOrderSummary, LaboratoryModule, NewDiagnosticReport,
    NewLabOrder, NewLabTest, ReportStatus, TestPrice,
};
use crate::modules::monitoring::{
    MonitoringModule, NewObservation, ObservationStatus, ObservationSummary,
};
use crate::modules::pharmacy::{
    InventoryItemSummary, MedicationOrderSummary, NewInventoryItem, NewMedicationOrder,
    PharmacyModule,
};
use crate::{log_error_with_context, log_write_rejected};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::Instrument;

/// Runs `$body` in a fresh transaction, committing only on `Ok`
macro_rules! write_request {
    ($db:expr, $ctx:expr, $op:literal, |$tx:ident| $body:expr) => {
        async {
            let mut $tx = $db.begin().await;
            match $body.await {
                Ok(value) => {
                    $tx.commit();
                    Ok(value)
                }
                Err(e) => {
                    log_write_rejected!($op, &e);
                    Err(e)
                }
            }
        }
        .instrument($ctx.span($op))
        .await
    };
}

/// Every module wired over one record store
///
/// Module fields expose each module's accessor for reads and its service for
/// callers that manage their own transaction.
pub struct Hospital {
    db: Database,
    orchestrator: CareOrchestrator,
    pub identity: IdentityModule,
    pub admission: AdmissionModule,
    pub monitoring: MonitoringModule,
    pub pharmacy: PharmacyModule,
    pub laboratory: LaboratoryModule,
    pub billing: BillingModule,
    pub discharge: DischargeModule,
}

impl Hospital {
    /// Builds a hospital with the ledger backend selected in `config`
    ///
    /// # Errors
    ///
    /// Returns a `Database` error if the PostgreSQL ledger cannot connect or
    /// migrate.
    pub async fn from_config(config: &WardhavenConfig) -> Result<Self> {
        let ledger = create_sequence_ledger(config).await?;
        Ok(Self::with_ledger(config, ledger))
    }

    /// Builds a hospital over an existing identifier ledger
    pub fn with_ledger(config: &WardhavenConfig, ledger: Arc<dyn SequenceLedger>) -> Self {
        let ids = SequentialIdGenerator::new(ledger, &config.identifiers);
        let db = Database::new();

        let identity = IdentityModule::new(ids.clone(), config.identifiers.patient_prefix.clone());
        let admission = AdmissionModule::new(identity.access.clone(), &config.identifiers);
        let monitoring = MonitoringModule::new(admission.access.clone());
        let pharmacy = PharmacyModule::new(
            admission.access.clone(),
            identity.access.clone(),
            &config.billing.currency,
        );
        let laboratory = LaboratoryModule::new(
            admission.access.clone(),
            identity.access.clone(),
            &config.billing.currency,
        );
        let billing = BillingModule::new(
            ids,
            config,
            admission.access.clone(),
            identity.access.clone(),
            &pharmacy,
            &laboratory,
        );
        let discharge = DischargeModule::new(
            admission.access.clone(),
            identity.access.clone(),
            billing.access.clone(),
            &config.discharge,
        );
        let orchestrator = CareOrchestrator::new(
            db.clone(),
            admission.service.clone(),
            discharge.service.clone(),
        );

        tracing::debug!(backend = ?config.ledger.backend, "Hospital modules wired");

        Self {
            db,
            orchestrator,
            identity,
            admission,
            monitoring,
            pharmacy,
            laboratory,
            billing,
            discharge,
        }
    }

    /// Record store shared by every module
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Event handler and discharge gatekeeper
    pub fn orchestrator(&self) -> &CareOrchestrator {
        &self.orchestrator
    }

    // Identity

    /// Registers an organization
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` for a blank name.
    pub async fn register_organization(
        &self,
        ctx: &RequestContext,
        input: NewOrganization,
    ) -> Result<Registration<OrganizationSummary>> {
        write_request!(self.db, ctx, "register_organization", |tx| self
            .identity
            .service
            .register_organization(ctx, &mut tx, input))
    }

    /// Activates or deactivates an organization
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` if no organization has `id`.
    pub async fn set_organization_active(
        &self,
        ctx: &RequestContext,
        id: OrganizationId,
        active: bool,
    ) -> Result<OrganizationSummary> {
        write_request!(self.db, ctx, "set_organization_active", |tx| self
            .identity
            .service
            .set_organization_active(ctx, &mut tx, id, active))
    }

    /// Registers a location under its managing organization
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` if the organization does not exist.
    pub async fn register_location(
        &self,
        ctx: &RequestContext,
        input: NewLocation,
    ) -> Result<Registration<LocationSummary>> {
        write_request!(self.db, ctx, "register_location", |tx| self
            .identity
            .service
            .register_location(ctx, &mut tx, input))
    }

    /// Registers a practitioner
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` for a blank first or last name.
    pub async fn register_practitioner(
        &self,
        ctx: &RequestContext,
        input: NewPractitioner,
    ) -> Result<Registration<PractitionerSummary>> {
        write_request!(self.db, ctx, "register_practitioner", |tx| self
            .identity
            .service
            .register_practitioner(ctx, &mut tx, input))
    }

    /// Registers a patient and issues the next medical record number
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` for a blank name, `Validation` for a
    /// future birth date, and `DuplicateIdentifier` or `Database` if the
    /// identifier ledger fails.
    pub async fn register_patient(
        &self,
        ctx: &RequestContext,
        input: NewPatient,
    ) -> Result<Registration<PatientSummary>> {
        write_request!(self.db, ctx, "register_patient", |tx| self
            .identity
            .service
            .register_patient(ctx, &mut tx, input))
    }

    // Admission

    /// Opens an encounter, then delivers its events
    ///
    /// The encounter is committed before its events are handled. A failing
    /// event handler is logged and does not undo the admission.
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` for an unknown patient, practitioner,
    /// location or organization and `Validation` for a terminal start status.
    pub async fn admit(&self, ctx: &RequestContext, input: NewEncounter) -> Result<EncounterSummary> {
        let admitted = write_request!(self.db, ctx, "create_encounter", |tx| self
            .admission
            .service
            .create_encounter(ctx, &mut tx, input))?;

        if let Err(e) = self.orchestrator.dispatch(ctx, &admitted.events).await {
            log_error_with_context!(&e, "Event dispatch failed after admission");
        }
        Ok(admitted.encounter)
    }

    /// Moves an encounter along its status lifecycle
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the lifecycle forbids `to`.
    pub async fn update_encounter_status(
        &self,
        ctx: &RequestContext,
        id: EncounterId,
        to: EncounterStatus,
    ) -> Result<EncounterSummary> {
        write_request!(self.db, ctx, "update_encounter_status", |tx| self
            .admission
            .service
            .update_encounter_status(ctx, &mut tx, id, to))
    }

    /// Records a procedure performed during an encounter
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` for an unknown encounter or performer
    /// and `Validation` if the encounter is cancelled or entered in error.
    pub async fn add_procedure(
        &self,
        ctx: &RequestContext,
        input: NewProcedure,
    ) -> Result<ProcedureSummary> {
        write_request!(self.db, ctx, "add_procedure", |tx| self
            .admission
            .service
            .add_procedure(ctx, &mut tx, input))
    }

    // Monitoring

    /// Records an observation against an encounter
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` for an unknown encounter and
    /// `Validation` if the encounter is cancelled or entered in error.
    pub async fn record_observation(
        &self,
        ctx: &RequestContext,
        input: NewObservation,
    ) -> Result<ObservationSummary> {
        write_request!(self.db, ctx, "record_observation", |tx| self
            .monitoring
            .service
            .record_observation(ctx, &mut tx, input))
    }

    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the observation cannot move to `to`.
    pub async fn set_observation_status(
        &self,
        ctx: &RequestContext,
        id: ObservationId,
        to: ObservationStatus,
    ) -> Result<ObservationSummary> {
        write_request!(self.db, ctx, "set_observation_status", |tx| self
            .monitoring
            .service
            .set_observation_status(ctx, &mut tx, id, to))
    }

    // Pharmacy

    /// Adds an item to the pharmacy catalog
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the code is already catalogued.
    pub async fn add_catalog_item(
        &self,
        ctx: &RequestContext,
        input: NewInventoryItem,
    ) -> Result<InventoryItemSummary> {
        write_request!(self.db, ctx, "add_catalog_item", |tx| self
            .pharmacy
            .service
            .add_catalog_item(ctx, &mut tx, input))
    }

    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` for an unknown code and `Validation`
    /// for a zero quantity.
    pub async fn restock(
        &self,
        ctx: &RequestContext,
        code: &str,
        quantity: u32,
    ) -> Result<InventoryItemSummary> {
        write_request!(self.db, ctx, "restock", |tx| self
            .pharmacy
            .service
            .restock(ctx, &mut tx, code, quantity))
    }

    /// Creates a medication order
    ///
    /// # Arguments
    ///
    /// * `ctx` - Request context carrying the actor
    /// * `input` - Encounter, prescriber, item code and quantity
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` for an unknown encounter, prescriber or
    /// item, and `Validation` for a zero quantity or a closed encounter.
    pub async fn prescribe(
        &self,
        ctx: &RequestContext,
        input: NewMedicationOrder,
    ) -> Result<MedicationOrderSummary> {
        write_request!(self.db, ctx, "create_medication_order", |tx| self
            .pharmacy
            .service
            .create_medication_order(ctx, &mut tx, input))
    }

    /// Dispenses a medication order and draws down stock
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` if stock cannot cover the order and
    /// `InvalidStateTransition` if the order is not active.
    pub async fn dispense(
        &self,
        ctx: &RequestContext,
        id: MedicationOrderId,
    ) -> Result<MedicationOrderSummary> {
        write_request!(self.db, ctx, "dispense", |tx| self
            .pharmacy
            .service
            .dispense(ctx, &mut tx, id))
    }

    /// # Errors
    ///
    /// Returns `Conflict` if the order is on an invoice and
    /// `InvalidStateTransition` if it is not active.
    pub async fn cancel_medication_order(
        &self,
        ctx: &RequestContext,
        id: MedicationOrderId,
    ) -> Result<MedicationOrderSummary> {
        write_request!(self.db, ctx, "cancel_medication_order", |tx| self
            .pharmacy
            .service
            .cancel_medication_order(ctx, &mut tx, id))
    }

    // Laboratory

    /// Adds a test definition to the laboratory catalog
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the code is already defined.
    pub async fn add_lab_test(&self, ctx: &RequestContext, input: NewLabTest) -> Result<TestPrice> {
        write_request!(self.db, ctx, "add_test_definition", |tx| self
            .laboratory
            .service
            .add_test_definition(ctx, &mut tx, input))
    }

    /// Creates a lab order
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` for an unknown encounter or requester
    /// and `Validation` if the encounter is cancelled or entered in error.
    pub async fn order_lab_test(
        &self,
        ctx: &RequestContext,
        input: NewLabOrder,
    ) -> Result<LabOrderSummary> {
        write_request!(self.db, ctx, "create_lab_order", |tx| self
            .laboratory
            .service
            .create_lab_order(ctx, &mut tx, input))
    }

    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the order is still requested.
    pub async fn cancel_lab_order(
        &self,
        ctx: &RequestContext,
        id: LabOrderId,
    ) -> Result<LabOrderSummary> {
        write_request!(self.db, ctx, "cancel_lab_order", |tx| self
            .laboratory
            .service
            .cancel_lab_order(ctx, &mut tx, id))
    }

    /// Files a diagnostic report for a patient
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` for an unknown patient or encounter
    /// and `Validation` if the encounter belongs to another patient.
    pub async fn file_report(
        &self,
        ctx: &RequestContext,
        input: NewDiagnosticReport,
    ) -> Result<DiagnosticReportSummary> {
        write_request!(self.db, ctx, "create_diagnostic_report", |tx| self
            .laboratory
            .service
            .create_diagnostic_report(ctx, &mut tx, input))
    }

    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` if no report has `id`.
    pub async fn update_report_status(
        &self,
        ctx: &RequestContext,
        id: DiagnosticReportId,
        to: ReportStatus,
        conclusion: Option<String>,
    ) -> Result<DiagnosticReportSummary> {
        write_request!(self.db, ctx, "update_report_status", |tx| self
            .laboratory
            .service
            .update_report_status(ctx, &mut tx, id, to, conclusion))
    }

    // Billing

    /// Builds a draft invoice from the encounter's unbilled orders and reports
    ///
    /// Billed orders and reports are marked with the new invoice id.
    ///
    /// # Arguments
    ///
    /// * `encounter_id` - Encounter whose charges are collected
    /// * `issuer_id` - Organization issuing the invoice
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` for an unknown encounter or issuer,
    /// `Validation` for an inactive issuer, and `Conflict` while the encounter
    /// already has an open invoice.
    pub async fn generate_draft_invoice(
        &self,
        ctx: &RequestContext,
        encounter_id: EncounterId,
        issuer_id: OrganizationId,
    ) -> Result<DraftInvoice> {
        write_request!(self.db, ctx, "generate_draft_invoice", |tx| self
            .billing
            .service
            .generate_draft_invoice(ctx, &mut tx, encounter_id, issuer_id))
    }

    /// Appends a manual line to a draft invoice
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a zero quantity, a negative price or an
    /// oversized discount, and `InvalidStateTransition` if the invoice is no
    /// longer a draft.
    pub async fn add_manual_line(
        &self,
        ctx: &RequestContext,
        invoice_id: InvoiceId,
        line: ManualLine,
    ) -> Result<InvoiceLineSummary> {
        write_request!(self.db, ctx, "add_manual_line", |tx| self
            .billing
            .service
            .add_manual_line(ctx, &mut tx, invoice_id, line))
    }

    /// Issues a draft invoice and assigns its invoice number
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the invoice is not a draft.
    pub async fn issue_invoice(
        &self,
        ctx: &RequestContext,
        invoice_id: InvoiceId,
    ) -> Result<InvoiceSummary> {
        write_request!(self.db, ctx, "issue_invoice", |tx| self
            .billing
            .service
            .issue_invoice(ctx, &mut tx, invoice_id))
    }

    /// Records a payment, balancing the invoice once fully paid
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-positive amount or one above the balance
    /// and `InvalidStateTransition` unless the invoice is issued.
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        invoice_id: InvoiceId,
        amount: Decimal,
    ) -> Result<InvoiceSummary> {
        write_request!(self.db, ctx, "record_payment", |tx| self
            .billing
            .service
            .record_payment(ctx, &mut tx, invoice_id, amount))
    }

    /// Cancels an invoice and releases its orders and reports for rebilling
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` for a balanced or cancelled invoice and
    /// `Conflict` once payments have been recorded.
    pub async fn cancel_invoice(
        &self,
        ctx: &RequestContext,
        invoice_id: InvoiceId,
    ) -> Result<InvoiceSummary> {
        write_request!(self.db, ctx, "cancel_invoice", |tx| self
            .billing
            .service
            .cancel_invoice(ctx, &mut tx, invoice_id))
    }

    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the invoice is a draft.
    pub async fn delete_draft_invoice(
        &self,
        ctx: &RequestContext,
        invoice_id: InvoiceId,
    ) -> Result<()> {
        write_request!(self.db, ctx, "delete_draft_invoice", |tx| self
            .billing
            .service
            .delete_draft_invoice(ctx, &mut tx, invoice_id))
    }

    // Discharge

    /// Starts a discharge for an encounter
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntityNotFound` for an unknown encounter, `Validation`
    /// if it belongs to another patient, and `Conflict` if a discharge exists.
    pub async fn initiate_discharge(
        &self,
        ctx: &RequestContext,
        encounter_id: EncounterId,
        patient_id: PatientId,
    ) -> Result<DischargeSummary> {
        write_request!(self.db, ctx, "initiate_discharge", |tx| self
            .discharge
            .service
            .initiate(ctx, &mut tx, encounter_id, patient_id))
    }

    /// Fills in discharge checklist fields
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the discharge is already finalized.
    pub async fn update_discharge(
        &self,
        ctx: &RequestContext,
        id: DischargeId,
        changes: DischargeUpdate,
    ) -> Result<DischargeSummary> {
        write_request!(self.db, ctx, "update_discharge", |tx| self
            .discharge
            .service
            .update(ctx, &mut tx, id, changes))
    }

    /// Finalizes a discharge and finishes its encounter in one transaction
    ///
    /// # Errors
    ///
    /// Returns `FinancialClearanceRequired` while the encounter has an
    /// outstanding balance and `MissingRequiredField` for the first unmet
    /// checklist gate when the checklist is enforced.
    pub async fn complete_discharge(
        &self,
        ctx: &RequestContext,
        id: DischargeId,
        finalized_by: PractitionerId,
    ) -> Result<CompletedDischarge> {
        write_request!(self.db, ctx, "complete_discharge", |tx| self
            .orchestrator
            .complete_discharge(ctx, &mut tx, id, finalized_by))
    }
}
