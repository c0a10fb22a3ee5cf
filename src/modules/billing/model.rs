//! Invoices, line items and price components

use crate::domain::money::{round_money, zero};
use crate::domain::{
    DiagnosticReportId, EncounterId, InvoiceId, InvoiceLineId, MedicationOrderId,
    OrganizationId, PatientId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Balanced,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Balanced => "balanced",
            Self::Cancelled => "cancelled",
        }
    }

    /// Draft and issued invoices block a new draft for the same encounter
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Draft | Self::Issued)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Pharmacy,
    Laboratory,
    Other,
}

/// Record an invoice line was priced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LineSource {
    MedicationOrder(MedicationOrderId),
    DiagnosticReport(DiagnosticReportId),
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Base,
    Tax,
    Discount,
    Surcharge,
}

/// Signed part of a line amount; discounts are stored negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceComponent {
    pub kind: ComponentType,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalComponentType {
    GrossAmount,
    NetAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalComponent {
    pub kind: TotalComponentType,
    pub amount: Decimal,
}

/// Manually added charge (type `other`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualLine {
    pub code: Option<String>,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Fraction, `0.08` for 8 %
    pub tax_rate: Option<Decimal>,
    /// Absolute amount taken off the line before tax
    pub discount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineSummary {
    pub id: InvoiceLineId,
    pub invoice_id: InvoiceId,
    pub line_type: LineType,
    pub source: LineSource,
    pub code: Option<String>,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub amount: Decimal,
    pub components: Vec<PriceComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub id: InvoiceId,
    /// `INV-2026-00001`
    pub external_id: String,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub issuer_id: OrganizationId,
    pub status: InvoiceStatus,
    pub currency: String,
    pub total_gross: Decimal,
    pub total_net: Decimal,
    pub amount_paid: Decimal,
    pub total_components: Vec<TotalComponent>,
    pub created_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl InvoiceSummary {
    /// Net total still unpaid
    pub fn outstanding(&self) -> Decimal {
        self.total_net - self.amount_paid
    }
}

/// Result of draft generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftInvoice {
    pub invoice: InvoiceSummary,
    pub lines: Vec<InvoiceLineSummary>,
    pub line_count: usize,
}

/// What an encounter still owes, as the discharge gatekeeper sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterBalance {
    pub encounter_id: EncounterId,
    /// Unpaid net total over draft and issued invoices
    pub outstanding: Decimal,
    pub latest_invoice_id: Option<InvoiceId>,
    pub latest_status: Option<InvoiceStatus>,
}

impl EncounterBalance {
    /// Nothing outstanding, or the latest invoice is fully paid
    pub fn is_cleared(&self) -> bool {
        self.outstanding.is_zero() || self.latest_status == Some(InvoiceStatus::Balanced)
    }
}

#[derive(Debug, Clone)]
pub(super) struct Invoice {
    pub id: i64,
    pub external_id: String,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub issuer_id: OrganizationId,
    pub status: InvoiceStatus,
    pub currency: String,
    pub total_gross: Decimal,
    pub total_net: Decimal,
    pub amount_paid: Decimal,
    pub created_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Recomputes both totals from the invoice's lines
    pub fn set_totals<'a>(&mut self, lines: impl Iterator<Item = &'a InvoiceLine>) {
        let gross = lines.fold(zero(), |sum, line| sum + line.amount);
        self.total_gross = round_money(gross);
        self.total_net = self.total_gross;
    }

    pub fn summary(&self) -> InvoiceSummary {
        InvoiceSummary {
            id: InvoiceId::new(self.id),
            external_id: self.external_id.clone(),
            encounter_id: self.encounter_id,
            patient_id: self.patient_id,
            issuer_id: self.issuer_id,
            status: self.status,
            currency: self.currency.clone(),
            total_gross: self.total_gross,
            total_net: self.total_net,
            amount_paid: self.amount_paid,
            total_components: vec![
                TotalComponent {
                    kind: TotalComponentType::GrossAmount,
                    amount: self.total_gross,
                },
                TotalComponent {
                    kind: TotalComponentType::NetAmount,
                    amount: self.total_net,
                },
            ],
            created_at: self.created_at,
            issued_at: self.issued_at,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct InvoiceLine {
    pub id: i64,
    pub invoice_id: InvoiceId,
    pub line_type: LineType,
    pub source: LineSource,
    pub code: Option<String>,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub amount: Decimal,
    pub components: Vec<PriceComponent>,
}

impl InvoiceLine {
    pub fn summary(&self) -> InvoiceLineSummary {
        InvoiceLineSummary {
            id: InvoiceLineId::new(self.id),
            invoice_id: self.invoice_id,
            line_type: self.line_type,
            source: self.source,
            code: self.code.clone(),
            description: self.description.clone(),
            unit_price: self.unit_price,
            quantity: self.quantity,
            amount: self.amount,
            components: self.components.clone(),
        }
    }
}

/// Prices a line: base, then discount, then tax on the discounted base
///
/// Returns the line amount and its components. Every amount is rounded to
/// cents and the components always sum to the amount.
pub(super) fn price_line(
    unit_price: Decimal,
    quantity: u32,
    discount: Option<Decimal>,
    tax_rate: Option<Decimal>,
) -> (Decimal, Vec<PriceComponent>) {
    let base = round_money(unit_price * Decimal::from(quantity));
    let mut components = vec![PriceComponent {
        kind: ComponentType::Base,
        amount: base,
    }];
    let mut amount = base;

    if let Some(discount) = discount.filter(|d| !d.is_zero()) {
        let discount = round_money(discount);
        components.push(PriceComponent {
            kind: ComponentType::Discount,
            amount: -discount,
        });
        amount -= discount;
    }
    if let Some(rate) = tax_rate.filter(|r| !r.is_zero()) {
        let tax = round_money(amount * rate);
        components.push(PriceComponent {
            kind: ComponentType::Tax,
            amount: tax,
        });
        amount += tax;
    }

    (amount, components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_line_base_only() {
        let (amount, components) = price_line(dec!(10.00), 5, None, None);
        assert_eq!(amount, dec!(50.00));
        assert_eq!(
            components,
            vec![PriceComponent {
                kind: ComponentType::Base,
                amount: dec!(50.00)
            }]
        );
    }

    #[test]
    fn test_price_line_components_sum_to_amount() {
        let (amount, components) = price_line(dec!(19.99), 3, Some(dec!(5)), Some(dec!(0.0825)));
        // base 59.97, discount 5.00, tax 8.25% of 54.97 = 4.535 -> 4.54
        assert_eq!(amount, dec!(59.51));
        let sum: Decimal = components.iter().map(|c| c.amount).sum();
        assert_eq!(sum, amount);
    }

    #[test]
    fn test_balance_clearance() {
        let mut balance = EncounterBalance {
            encounter_id: EncounterId::new(1),
            outstanding: dec!(0.00),
            latest_invoice_id: None,
            latest_status: None,
        };
        assert!(balance.is_cleared());

        balance.outstanding = dec!(12.50);
        balance.latest_status = Some(InvoiceStatus::Issued);
        assert!(!balance.is_cleared());

        balance.latest_status = Some(InvoiceStatus::Balanced);
        assert!(balance.is_cleared());
    }
}
