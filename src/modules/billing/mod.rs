//! Billing: invoice orchestration, payments and encounter balances
//!
//! Draft invoices are assembled from pharmacy and laboratory data read through
//! their accessors. Source records are marked billed through the owning
//! module's write service inside the same transaction, and released the same
//! way when an invoice is cancelled or deleted.

pub mod access;
pub mod model;
pub mod service;

pub use access::{BillingAccess, StoreBillingAccess};
pub use model::{
    ComponentType, DraftInvoice, EncounterBalance, InvoiceLineSummary, InvoiceStatus,
    InvoiceSummary, LineSource, LineType, ManualLine, PriceComponent, TotalComponent,
    TotalComponentType,
};
pub use service::BillingService;

use crate::adapters::memory::{RecordSet, Table};
use crate::config::WardhavenConfig;
use crate::core::identifiers::SequentialIdGenerator;
use crate::modules::admission::AdmissionAccess;
use crate::modules::identity::IdentityAccess;
use crate::modules::laboratory::LaboratoryModule;
use crate::modules::pharmacy::PharmacyModule;
use model::{Invoice, InvoiceLine};
use std::sync::Arc;

#[derive(Clone)]
struct BillingTables {
    invoices: Arc<Table<RecordSet<Invoice>>>,
    lines: Arc<Table<RecordSet<InvoiceLine>>>,
}

pub struct BillingModule {
    pub access: Arc<dyn BillingAccess>,
    pub service: Arc<BillingService>,
}

impl BillingModule {
    pub fn new(
        ids: SequentialIdGenerator,
        config: &WardhavenConfig,
        admission: Arc<dyn AdmissionAccess>,
        identity: Arc<dyn IdentityAccess>,
        pharmacy: &PharmacyModule,
        laboratory: &LaboratoryModule,
    ) -> Self {
        let tables = BillingTables {
            invoices: Table::new("billing.invoices", RecordSet::default()),
            lines: Table::new("billing.invoice_lines", RecordSet::default()),
        };
        let service = BillingService {
            tables: tables.clone(),
            ids,
            invoice_prefix: config.identifiers.invoice_prefix.clone(),
            currency: config.billing.currency.clone(),
            admission,
            identity,
            pharmacy: pharmacy.access.clone(),
            pharmacy_writer: pharmacy.service.clone(),
            laboratory: laboratory.access.clone(),
            laboratory_writer: laboratory.service.clone(),
        };
        Self {
            access: Arc::new(StoreBillingAccess::new(tables)),
            service: Arc::new(service),
        }
    }
}
