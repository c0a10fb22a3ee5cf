//! Invoice orchestration and invoice lifecycle

use super::model::{
    price_line, DraftInvoice, Invoice, InvoiceLine, InvoiceLineSummary, InvoiceStatus,
    InvoiceSummary, LineSource, LineType, ManualLine,
};
use super::BillingTables;
use crate::adapters::memory::Transaction;
use crate::core::identifiers::SequentialIdGenerator;
use crate::domain::money::{ensure_non_negative, round_money, zero};
use crate::domain::validate::{optional_text, required_text};
use crate::domain::{
    DiagnosticReportId, EncounterId, HospitalError, InvoiceId, MedicationOrderId,
    OrganizationId, RequestContext, Result,
};
use crate::modules::admission::AdmissionAccess;
use crate::modules::identity::IdentityAccess;
use crate::modules::laboratory::{LaboratoryAccess, LaboratoryService};
use crate::modules::pharmacy::{PharmacyAccess, PharmacyService};
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct BillingService {
    pub(super) tables: BillingTables,
    pub(super) ids: SequentialIdGenerator,
    pub(super) invoice_prefix: String,
    pub(super) currency: String,
    pub(super) admission: Arc<dyn AdmissionAccess>,
    pub(super) identity: Arc<dyn IdentityAccess>,
    pub(super) pharmacy: Arc<dyn PharmacyAccess>,
    pub(super) pharmacy_writer: Arc<PharmacyService>,
    pub(super) laboratory: Arc<dyn LaboratoryAccess>,
    pub(super) laboratory_writer: Arc<LaboratoryService>,
}

impl BillingService {
    /// Assembles a draft invoice for everything billable on an encounter
    ///
    /// Medication orders that are neither cancelled nor billed become
    /// `pharmacy` lines; released, unbilled diagnostic reports with a test code
    /// become `laboratory` lines. Items missing from a catalog are priced at
    /// zero. Every source record is marked billed to the new invoice in `tx`.
    ///
    /// # Errors
    ///
    /// - `ReferencedEntityNotFound` for an unknown encounter or issuer
    /// - `Validation` when the issuer is inactive
    /// - `Conflict` when the encounter already has a draft or issued invoice
    pub async fn generate_draft_invoice(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        encounter_id: EncounterId,
        issuer_id: OrganizationId,
    ) -> Result<DraftInvoice> {
        let encounter = self
            .admission
            .within(tx)
            .get_encounter_summary(encounter_id)
            .await
            .ok_or_else(|| HospitalError::not_found("encounter", "encounter_id", encounter_id))?;
        let issuer = self
            .identity
            .within(tx)
            .get_organization_summary(issuer_id)
            .await
            .ok_or_else(|| HospitalError::not_found("organization", "issuer_id", issuer_id))?;
        if !issuer.active {
            return Err(HospitalError::Validation(format!(
                "organization {} is inactive",
                issuer.name
            )));
        }
        if let Some(open) = tx
            .read(&self.tables.invoices)
            .values()
            .find(|i| i.encounter_id == encounter_id && i.status.is_open())
        {
            return Err(HospitalError::Conflict(format!(
                "encounter {encounter_id} already has {} invoice {}",
                open.status, open.external_id
            )));
        }

        let external_id = self.ids.next(ctx, &self.invoice_prefix).await?;
        let now = ctx.now();
        let invoice_id = InvoiceId::new(tx.write(&self.tables.invoices).insert_with(|id| {
            Invoice {
                id,
                external_id,
                encounter_id,
                patient_id: encounter.patient_id,
                issuer_id,
                status: InvoiceStatus::Draft,
                currency: self.currency.clone(),
                total_gross: zero(),
                total_net: zero(),
                amount_paid: zero(),
                created_at: now,
                issued_at: None,
            }
        }));

        let mut lines = Vec::new();
        let mut billed_orders: Vec<MedicationOrderId> = Vec::new();
        let orders = self
            .pharmacy
            .within(tx)
            .get_encounter_requests(encounter_id)
            .await;
        for order in orders {
            if !order.is_billable() {
                continue;
            }
            let pricing = self.pharmacy.within(tx).get_item_pricing(&order.item_code).await;
            let (unit_price, description) = match pricing {
                Some(p) => {
                    self.warn_on_currency(ctx, &order.item_code, &p.currency);
                    (p.unit_cost, p.name)
                }
                None => {
                    tracing::warn!(
                        correlation_id = %ctx.correlation_id(),
                        item_code = %order.item_code,
                        "No catalog price for item, billing at zero"
                    );
                    (zero(), order.item_code.clone())
                }
            };
            lines.push(self.add_line(
                tx,
                invoice_id,
                LineType::Pharmacy,
                LineSource::MedicationOrder(order.id),
                Some(order.item_code.clone()),
                description,
                unit_price,
                order.quantity,
                None,
                None,
            ));
            billed_orders.push(order.id);
        }

        let mut billed_reports: Vec<DiagnosticReportId> = Vec::new();
        let reports = self
            .laboratory
            .within(tx)
            .get_patient_reports(encounter.patient_id, Some(encounter_id))
            .await;
        for report in reports {
            if !report.is_billable() {
                continue;
            }
            let Some(code) = report.test_code.clone() else {
                tracing::debug!(
                    correlation_id = %ctx.correlation_id(),
                    report_id = %report.id,
                    "Report has no test code, not billed"
                );
                continue;
            };
            let price = self.laboratory.within(tx).get_test_price(&code).await;
            let (unit_price, description) = match price {
                Some(p) => {
                    self.warn_on_currency(ctx, &code, &p.currency);
                    (p.base_price, p.name)
                }
                None => {
                    tracing::warn!(
                        correlation_id = %ctx.correlation_id(),
                        test_code = %code,
                        "No catalog price for test, billing at zero"
                    );
                    (zero(), code.clone())
                }
            };
            lines.push(self.add_line(
                tx,
                invoice_id,
                LineType::Laboratory,
                LineSource::DiagnosticReport(report.id),
                Some(code),
                description,
                unit_price,
                1,
                None,
                None,
            ));
            billed_reports.push(report.id);
        }

        let invoice = self.refresh_totals(tx, invoice_id)?;
        self.pharmacy_writer
            .mark_orders_billed(ctx, tx, &billed_orders, invoice_id)
            .await?;
        self.laboratory_writer
            .mark_reports_billed(ctx, tx, &billed_reports, invoice_id)
            .await?;

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice.id,
            external_id = %invoice.external_id,
            encounter_id = %encounter_id,
            lines = lines.len(),
            total_gross = %invoice.total_gross,
            "Draft invoice generated"
        );
        Ok(DraftInvoice {
            invoice,
            line_count: lines.len(),
            lines,
        })
    }

    /// Adds a manual `other` line to a draft invoice
    pub async fn add_manual_line(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        invoice_id: InvoiceId,
        line: ManualLine,
    ) -> Result<InvoiceLineSummary> {
        let description = required_text("description", &line.description)?;
        let unit_price = ensure_non_negative("unit_price", line.unit_price)?;
        if line.quantity == 0 {
            return Err(HospitalError::Validation(
                "quantity must be positive".to_string(),
            ));
        }
        let discount = line
            .discount
            .map(|d| ensure_non_negative("discount", d))
            .transpose()?;
        let tax_rate = line.tax_rate.map(ensure_rate).transpose()?;
        if let Some(discount) = discount {
            if discount > round_money(unit_price * Decimal::from(line.quantity)) {
                return Err(HospitalError::Validation(format!(
                    "discount {discount} exceeds the line base amount"
                )));
            }
        }

        self.require_status(tx, invoice_id, InvoiceStatus::Draft, InvoiceStatus::Draft)?;
        let summary = self.add_line(
            tx,
            invoice_id,
            LineType::Other,
            LineSource::Manual,
            optional_text(line.code),
            description,
            unit_price,
            line.quantity,
            discount,
            tax_rate,
        );
        let invoice = self.refresh_totals(tx, invoice_id)?;

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice_id,
            amount = %summary.amount,
            total_gross = %invoice.total_gross,
            "Manual invoice line added"
        );
        Ok(summary)
    }

    /// Issues a draft; a zero-total invoice is balanced immediately
    pub async fn issue_invoice(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        invoice_id: InvoiceId,
    ) -> Result<InvoiceSummary> {
        self.require_status(tx, invoice_id, InvoiceStatus::Draft, InvoiceStatus::Issued)?;
        let invoice = self.invoice_mut(tx, invoice_id)?;
        invoice.status = if invoice.total_net.is_zero() {
            InvoiceStatus::Balanced
        } else {
            InvoiceStatus::Issued
        };
        invoice.issued_at = Some(ctx.now());

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice_id,
            status = %invoice.status,
            total_net = %invoice.total_net,
            "Invoice issued"
        );
        Ok(invoice.summary())
    }

    /// Records a payment against an issued invoice
    ///
    /// The invoice becomes `balanced` once fully paid. Overpayment is rejected.
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        invoice_id: InvoiceId,
        amount: Decimal,
    ) -> Result<InvoiceSummary> {
        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            return Err(HospitalError::Validation(
                "payment amount must be positive".to_string(),
            ));
        }
        self.require_status(tx, invoice_id, InvoiceStatus::Issued, InvoiceStatus::Balanced)?;

        let invoice = self.invoice_mut(tx, invoice_id)?;
        let outstanding = invoice.total_net - invoice.amount_paid;
        if amount > outstanding {
            return Err(HospitalError::Validation(format!(
                "payment {amount} exceeds outstanding balance {outstanding}"
            )));
        }
        invoice.amount_paid += amount;
        if invoice.amount_paid == invoice.total_net {
            invoice.status = InvoiceStatus::Balanced;
        }

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice_id,
            amount = %amount,
            amount_paid = %invoice.amount_paid,
            status = %invoice.status,
            "Payment recorded"
        );
        Ok(invoice.summary())
    }

    /// Cancels an unpaid draft or issued invoice and releases its sources
    pub async fn cancel_invoice(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        invoice_id: InvoiceId,
    ) -> Result<InvoiceSummary> {
        let current = self.get_in_tx(tx, invoice_id)?;
        if !current.status.is_open() {
            return Err(HospitalError::transition(
                "invoice",
                current.status,
                InvoiceStatus::Cancelled,
            ));
        }
        if !current.amount_paid.is_zero() {
            return Err(HospitalError::Conflict(format!(
                "invoice {} has {} paid against it",
                current.external_id, current.amount_paid
            )));
        }

        let invoice = self.invoice_mut(tx, invoice_id)?;
        invoice.status = InvoiceStatus::Cancelled;
        let invoice = invoice.summary();
        let released = self.release_sources(ctx, tx, invoice_id).await?;

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice_id,
            released,
            "Invoice cancelled"
        );
        Ok(invoice)
    }

    /// Removes a draft invoice with its lines and releases its sources
    pub async fn delete_draft_invoice(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        invoice_id: InvoiceId,
    ) -> Result<()> {
        self.require_status(tx, invoice_id, InvoiceStatus::Draft, InvoiceStatus::Cancelled)?;

        tx.write(&self.tables.invoices).remove(invoice_id.value());
        let lines = tx.write(&self.tables.lines);
        let doomed: Vec<i64> = lines
            .values()
            .filter(|l| l.invoice_id == invoice_id)
            .map(|l| l.id)
            .collect();
        for id in &doomed {
            lines.remove(*id);
        }
        let released = self.release_sources(ctx, tx, invoice_id).await?;

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice_id,
            lines = doomed.len(),
            released,
            "Draft invoice deleted"
        );
        Ok(())
    }

    async fn release_sources(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        invoice_id: InvoiceId,
    ) -> Result<usize> {
        let orders = self
            .pharmacy_writer
            .release_billing(ctx, tx, invoice_id)
            .await?;
        let reports = self
            .laboratory_writer
            .release_billing(ctx, tx, invoice_id)
            .await?;
        Ok(orders + reports)
    }

    #[allow(clippy::too_many_arguments)]
    fn add_line(
        &self,
        tx: &mut Transaction,
        invoice_id: InvoiceId,
        line_type: LineType,
        source: LineSource,
        code: Option<String>,
        description: String,
        unit_price: Decimal,
        quantity: u32,
        discount: Option<Decimal>,
        tax_rate: Option<Decimal>,
    ) -> InvoiceLineSummary {
        let unit_price = round_money(unit_price);
        let (amount, components) = price_line(unit_price, quantity, discount, tax_rate);
        tx.write(&self.tables.lines)
            .create(|id| InvoiceLine {
                id,
                invoice_id,
                line_type,
                source,
                code,
                description,
                unit_price,
                quantity,
                amount,
                components,
            })
            .summary()
    }

    fn refresh_totals(&self, tx: &mut Transaction, invoice_id: InvoiceId) -> Result<InvoiceSummary> {
        let lines = tx.read(&self.tables.lines);
        let invoice = self.invoice_mut(tx, invoice_id)?;
        invoice.set_totals(lines.values().filter(|l| l.invoice_id == invoice_id));
        Ok(invoice.summary())
    }

    fn get_in_tx(&self, tx: &Transaction, invoice_id: InvoiceId) -> Result<InvoiceSummary> {
        tx.read(&self.tables.invoices)
            .get(invoice_id.value())
            .map(|i| i.summary())
            .ok_or_else(|| HospitalError::not_found("invoice", "invoice_id", invoice_id))
    }

    fn invoice_mut<'t>(
        &self,
        tx: &'t mut Transaction,
        invoice_id: InvoiceId,
    ) -> Result<&'t mut Invoice> {
        tx.write(&self.tables.invoices)
            .get_mut(invoice_id.value())
            .ok_or_else(|| HospitalError::not_found("invoice", "invoice_id", invoice_id))
    }

    /// Fails unless the invoice is in `expected`, naming `to` as the attempted move
    fn require_status(
        &self,
        tx: &Transaction,
        invoice_id: InvoiceId,
        expected: InvoiceStatus,
        to: InvoiceStatus,
    ) -> Result<()> {
        let invoice = self.get_in_tx(tx, invoice_id)?;
        if invoice.status != expected {
            return Err(HospitalError::transition("invoice", invoice.status, to));
        }
        Ok(())
    }

    fn warn_on_currency(&self, ctx: &RequestContext, code: &str, currency: &str) {
        if currency != self.currency {
            tracing::warn!(
                correlation_id = %ctx.correlation_id(),
                code = %code,
                price_currency = %currency,
                invoice_currency = %self.currency,
                "Catalog price currency differs from invoice currency"
            );
        }
    }
}

fn ensure_rate(rate: Decimal) -> Result<Decimal> {
    if rate.is_sign_negative() || rate > Decimal::ONE {
        return Err(HospitalError::Validation(format!(
            "tax_rate must be between 0 and 1, got {rate}"
        )));
    }
    Ok(rate)
}
