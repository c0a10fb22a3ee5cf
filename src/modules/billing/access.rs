//! Read accessor for invoices and encounter balances

use super::model::{EncounterBalance, InvoiceLineSummary, InvoiceSummary};
use super::BillingTables;
use crate::adapters::memory::{Transaction, View};
use crate::domain::money::zero;
use crate::domain::{EncounterId, InvoiceId};
use async_trait::async_trait;

#[async_trait]
pub trait BillingAccess: Send + Sync {
    async fn validate_invoice_exists(&self, id: InvoiceId) -> bool;

    async fn get_invoice_summary(&self, id: InvoiceId) -> Option<InvoiceSummary>;

    async fn list_invoice_lines(&self, id: InvoiceId) -> Vec<InvoiceLineSummary>;

    async fn list_encounter_invoices(&self, encounter_id: EncounterId) -> Vec<InvoiceSummary>;

    /// Outstanding balance of an encounter; zero when it has no invoices
    async fn get_encounter_balance(&self, encounter_id: EncounterId) -> EncounterBalance;

    /// This accessor reading through `tx`, staged writes included
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn BillingAccess + 'a>;
}

pub struct StoreBillingAccess<'v> {
    tables: BillingTables,
    view: View<'v>,
}

impl StoreBillingAccess<'static> {
    pub(super) fn new(tables: BillingTables) -> Self {
        Self {
            tables,
            view: View::Committed,
        }
    }
}

#[async_trait]
impl<'v> BillingAccess for StoreBillingAccess<'v> {
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn BillingAccess + 'a> {
        Box::new(StoreBillingAccess {
            tables: self.tables.clone(),
            view: View::Pending(tx),
        })
    }

    async fn validate_invoice_exists(&self, id: InvoiceId) -> bool {
        self.view.load(&self.tables.invoices).contains(id.value())
    }

    async fn get_invoice_summary(&self, id: InvoiceId) -> Option<InvoiceSummary> {
        self.view
            .load(&self.tables.invoices)
            .get(id.value())
            .map(|i| i.summary())
    }

    async fn list_invoice_lines(&self, id: InvoiceId) -> Vec<InvoiceLineSummary> {
        self.view
            .load(&self.tables.lines)
            .values()
            .filter(|l| l.invoice_id == id)
            .map(|l| l.summary())
            .collect()
    }

    async fn list_encounter_invoices(&self, encounter_id: EncounterId) -> Vec<InvoiceSummary> {
        self.view
            .load(&self.tables.invoices)
            .values()
            .filter(|i| i.encounter_id == encounter_id)
            .map(|i| i.summary())
            .collect()
    }

    async fn get_encounter_balance(&self, encounter_id: EncounterId) -> EncounterBalance {
        let invoices = self.view.load(&self.tables.invoices);
        let mut outstanding = zero();
        let mut latest = None;
        for invoice in invoices.values().filter(|i| i.encounter_id == encounter_id) {
            if invoice.status.is_open() {
                outstanding += invoice.total_net - invoice.amount_paid;
            }
            // ids ascend with creation
            latest = Some(invoice);
        }

        EncounterBalance {
            encounter_id,
            outstanding,
            latest_invoice_id: latest.map(|i| InvoiceId::new(i.id)),
            latest_status: latest.map(|i| i.status),
        }
    }
}
