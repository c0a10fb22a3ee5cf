//! Pharmacy: inventory catalog, medication orders, dispensing
//!
//! Billing reads orders and prices through [`PharmacyAccess`] and marks orders as
//! billed through [`PharmacyService`] within its own transaction.

pub mod access;
pub mod model;
pub mod service;

pub use access::{PharmacyAccess, StorePharmacyAccess};
pub use model::{
    InventoryItemSummary, ItemPricing, MedicationOrderStatus, MedicationOrderSummary,
    NewInventoryItem, NewMedicationOrder,
};
pub use service::PharmacyService;

use crate::adapters::memory::{RecordSet, Table};
use crate::modules::admission::AdmissionAccess;
use crate::modules::identity::IdentityAccess;
use model::{InventoryItem, MedicationOrder};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
struct PharmacyTables {
    /// Keyed by normalized item code
    catalog: Arc<Table<BTreeMap<String, InventoryItem>>>,
    orders: Arc<Table<RecordSet<MedicationOrder>>>,
}

pub struct PharmacyModule {
    pub access: Arc<dyn PharmacyAccess>,
    pub service: Arc<PharmacyService>,
}

impl PharmacyModule {
    pub fn new(
        admission: Arc<dyn AdmissionAccess>,
        identity: Arc<dyn IdentityAccess>,
        currency: impl Into<String>,
    ) -> Self {
        let tables = PharmacyTables {
            catalog: Table::new("pharmacy.catalog", BTreeMap::new()),
            orders: Table::new("pharmacy.medication_orders", RecordSet::default()),
        };
        Self {
            access: Arc::new(StorePharmacyAccess::new(tables.clone())),
            service: Arc::new(PharmacyService::new(
                tables,
                admission,
                identity,
                currency.into(),
            )),
        }
    }
}
