//! Read accessor for the catalog and medication orders

use super::model::{item_key, InventoryItemSummary, ItemPricing, MedicationOrderSummary};
use super::PharmacyTables;
use crate::adapters::memory::{Transaction, View};
use crate::domain::{EncounterId, MedicationOrderId};
use async_trait::async_trait;

#[async_trait]
pub trait PharmacyAccess: Send + Sync {
    async fn validate_item_exists(&self, code: &str) -> bool;

    /// Catalog price for `code`, `None` when the item is not catalogued
    async fn get_item_pricing(&self, code: &str) -> Option<ItemPricing>;

    async fn get_inventory_item(&self, code: &str) -> Option<InventoryItemSummary>;

    async fn validate_medication_order_exists(&self, id: MedicationOrderId) -> bool;

    async fn get_medication_order_summary(
        &self,
        id: MedicationOrderId,
    ) -> Option<MedicationOrderSummary>;

    /// Every medication order of an encounter, in creation order
    async fn get_encounter_requests(&self, encounter_id: EncounterId)
        -> Vec<MedicationOrderSummary>;

    /// This accessor reading through `tx`, staged writes included
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn PharmacyAccess + 'a>;
}

pub struct StorePharmacyAccess<'v> {
    tables: PharmacyTables,
    view: View<'v>,
}

impl StorePharmacyAccess<'static> {
    pub(super) fn new(tables: PharmacyTables) -> Self {
        Self {
            tables,
            view: View::Committed,
        }
    }
}

#[async_trait]
impl<'v> PharmacyAccess for StorePharmacyAccess<'v> {
    fn within<'a>(&'a self, tx: &'a Transaction) -> Box<dyn PharmacyAccess + 'a> {
        Box::new(StorePharmacyAccess {
            tables: self.tables.clone(),
            view: View::Pending(tx),
        })
    }

    async fn validate_item_exists(&self, code: &str) -> bool {
        self.view.load(&self.tables.catalog).contains_key(&item_key(code))
    }

    async fn get_item_pricing(&self, code: &str) -> Option<ItemPricing> {
        self.view
            .load(&self.tables.catalog)
            .get(&item_key(code))
            .map(|item| item.pricing())
    }

    async fn get_inventory_item(&self, code: &str) -> Option<InventoryItemSummary> {
        self.view
            .load(&self.tables.catalog)
            .get(&item_key(code))
            .map(|item| item.summary())
    }

    async fn validate_medication_order_exists(&self, id: MedicationOrderId) -> bool {
        self.view.load(&self.tables.orders).contains(id.value())
    }

    async fn get_medication_order_summary(
        &self,
        id: MedicationOrderId,
    ) -> Option<MedicationOrderSummary> {
        self.view
            .load(&self.tables.orders)
            .get(id.value())
            .map(|o| o.summary())
    }

    async fn get_encounter_requests(
        &self,
        encounter_id: EncounterId,
    ) -> Vec<MedicationOrderSummary> {
        self.view
            .load(&self.tables.orders)
            .values()
            .filter(|o| o.encounter_id == encounter_id)
            .map(|o| o.summary())
            .collect()
    }
}
