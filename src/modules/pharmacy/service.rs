//! Write service for the catalog and medication orders

use super::model::{
    item_key, InventoryItem, InventoryItemSummary, MedicationOrder, MedicationOrderStatus,
    MedicationOrderSummary, NewInventoryItem, NewMedicationOrder,
};
use super::PharmacyTables;
use crate::adapters::memory::Transaction;
use crate::domain::money::{ensure_non_negative, normalize_currency};
use crate::domain::validate::{optional_text, required_text};
use crate::domain::{HospitalError, InvoiceId, MedicationOrderId, RequestContext, Result};
use crate::modules::admission::{AdmissionAccess, EncounterStatus};
use crate::modules::identity::IdentityAccess;
use std::sync::Arc;

pub struct PharmacyService {
    tables: PharmacyTables,
    admission: Arc<dyn AdmissionAccess>,
    identity: Arc<dyn IdentityAccess>,
    currency: String,
}

impl PharmacyService {
    pub(super) fn new(
        tables: PharmacyTables,
        admission: Arc<dyn AdmissionAccess>,
        identity: Arc<dyn IdentityAccess>,
        currency: String,
    ) -> Self {
        Self {
            tables,
            admission,
            identity,
            currency,
        }
    }

    /// Adds an item to the catalog; item codes are unique ignoring case
    pub async fn add_catalog_item(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewInventoryItem,
    ) -> Result<InventoryItemSummary> {
        let code = item_key(&required_text("code", &input.code)?);
        let name = required_text("name", &input.name)?;
        let unit_cost = ensure_non_negative("unit_cost", input.unit_cost)?;
        let currency = normalize_currency(input.currency.as_deref().unwrap_or(&self.currency))?;

        let catalog = tx.write(&self.tables.catalog);
        if catalog.contains_key(&code) {
            return Err(HospitalError::Conflict(format!(
                "inventory item {code} already exists"
            )));
        }
        let item = InventoryItem {
            code: code.clone(),
            name,
            unit_cost,
            currency,
            quantity_on_hand: input.quantity_on_hand,
        };
        let summary = item.summary();
        catalog.insert(code, item);

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            code = %summary.code,
            unit_cost = %summary.unit_cost,
            "Catalog item added"
        );
        Ok(summary)
    }

    pub async fn restock(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        code: &str,
        quantity: u32,
    ) -> Result<InventoryItemSummary> {
        if quantity == 0 {
            return Err(HospitalError::Validation(
                "restock quantity must be positive".to_string(),
            ));
        }
        let key = item_key(code);
        let item = tx
            .write(&self.tables.catalog)
            .get_mut(&key)
            .ok_or_else(|| HospitalError::not_found("inventory item", "item_code", &key))?;
        item.quantity_on_hand = item.quantity_on_hand.saturating_add(quantity);

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            code = %key,
            added = quantity,
            on_hand = item.quantity_on_hand,
            "Item restocked"
        );
        Ok(item.summary())
    }

    /// Prescribes an item for an encounter, taking the patient from it
    pub async fn create_medication_order(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewMedicationOrder,
    ) -> Result<MedicationOrderSummary> {
        let item_code = item_key(&required_text("item_code", &input.item_code)?);
        if input.quantity == 0 {
            return Err(HospitalError::Validation(
                "quantity must be positive".to_string(),
            ));
        }

        let encounter = self
            .admission
            .within(tx)
            .get_encounter_summary(input.encounter_id)
            .await
            .ok_or_else(|| {
                HospitalError::not_found("encounter", "encounter_id", input.encounter_id)
            })?;
        if matches!(
            encounter.status,
            EncounterStatus::Cancelled | EncounterStatus::EnteredInError
        ) {
            return Err(HospitalError::Validation(format!(
                "encounter {} is {}",
                encounter.id, encounter.status
            )));
        }
        if let Some(prescriber) = input.prescriber_id {
            if !self.identity.within(tx).validate_practitioner_exists(prescriber).await {
                return Err(HospitalError::not_found(
                    "practitioner",
                    "prescriber_id",
                    prescriber,
                ));
            }
        }

        if !tx.read(&self.tables.catalog).contains_key(&item_code) {
            tracing::warn!(
                correlation_id = %ctx.correlation_id(),
                item_code = %item_code,
                "Ordering uncatalogued item"
            );
        }

        let order = tx
            .write(&self.tables.orders)
            .create(|id| MedicationOrder {
                id,
                encounter_id: encounter.id,
                patient_id: encounter.patient_id,
                item_code,
                quantity: input.quantity,
                prescriber_id: input.prescriber_id,
                instructions: optional_text(input.instructions),
                status: MedicationOrderStatus::Active,
                invoice_id: None,
                ordered_at: ctx.now(),
            })
            .summary();

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            order_id = %order.id,
            encounter_id = %order.encounter_id,
            item_code = %order.item_code,
            quantity = order.quantity,
            "Medication order created"
        );
        Ok(order)
    }

    /// Dispenses an active order, drawing its quantity from stock
    pub async fn dispense(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: MedicationOrderId,
    ) -> Result<MedicationOrderSummary> {
        let order = tx
            .read(&self.tables.orders)
            .get(id.value())
            .map(|o| o.summary())
            .ok_or_else(|| HospitalError::not_found("medication order", "order_id", id))?;
        if order.status != MedicationOrderStatus::Active {
            return Err(HospitalError::transition(
                "medication order",
                order.status,
                MedicationOrderStatus::Dispensed,
            ));
        }

        tx.write(&self.tables.catalog)
            .get_mut(&order.item_code)
            .ok_or_else(|| {
                HospitalError::not_found("inventory item", "item_code", &order.item_code)
            })?
            .take(order.quantity)?;

        let order = self.set_status(tx, id, MedicationOrderStatus::Dispensed)?;
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            order_id = %id,
            item_code = %order.item_code,
            quantity = order.quantity,
            "Medication dispensed"
        );
        Ok(order)
    }

    /// Cancels an active order that is not on an invoice
    pub async fn cancel_medication_order(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: MedicationOrderId,
    ) -> Result<MedicationOrderSummary> {
        let order = tx
            .read(&self.tables.orders)
            .get(id.value())
            .map(|o| o.summary())
            .ok_or_else(|| HospitalError::not_found("medication order", "order_id", id))?;
        if let Some(invoice) = order.invoice_id {
            return Err(HospitalError::Conflict(format!(
                "medication order {id} is billed on invoice {invoice}"
            )));
        }
        if order.status != MedicationOrderStatus::Active {
            return Err(HospitalError::transition(
                "medication order",
                order.status,
                MedicationOrderStatus::Cancelled,
            ));
        }

        let order = self.set_status(tx, id, MedicationOrderStatus::Cancelled)?;
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            order_id = %id,
            "Medication order cancelled"
        );
        Ok(order)
    }

    /// Binds orders to an invoice
    ///
    /// Every order must exist, be uncancelled and unbilled; otherwise nothing
    /// is marked.
    pub async fn mark_orders_billed(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        ids: &[MedicationOrderId],
        invoice_id: InvoiceId,
    ) -> Result<()> {
        let orders = tx.write(&self.tables.orders);
        for id in ids {
            let order = orders
                .get(id.value())
                .ok_or_else(|| HospitalError::not_found("medication order", "order_id", id))?;
            if order.status == MedicationOrderStatus::Cancelled {
                return Err(HospitalError::Conflict(format!(
                    "medication order {id} is cancelled"
                )));
            }
            if let Some(existing) = order.invoice_id {
                return Err(HospitalError::Conflict(format!(
                    "medication order {id} is already billed on invoice {existing}"
                )));
            }
        }
        for id in ids {
            if let Some(order) = orders.get_mut(id.value()) {
                order.invoice_id = Some(invoice_id);
            }
        }

        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice_id,
            orders = ids.len(),
            "Medication orders marked billed"
        );
        Ok(())
    }

    /// Unbinds every order billed on `invoice_id`, returning how many were released
    pub async fn release_billing(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        invoice_id: InvoiceId,
    ) -> Result<usize> {
        let mut released = 0;
        for order in tx.write(&self.tables.orders).values_mut() {
            if order.invoice_id == Some(invoice_id) {
                order.invoice_id = None;
                released += 1;
            }
        }

        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            invoice_id = %invoice_id,
            released,
            "Medication order billing released"
        );
        Ok(released)
    }

    fn set_status(
        &self,
        tx: &mut Transaction,
        id: MedicationOrderId,
        status: MedicationOrderStatus,
    ) -> Result<MedicationOrderSummary> {
        let order = tx
            .write(&self.tables.orders)
            .get_mut(id.value())
            .ok_or_else(|| HospitalError::not_found("medication order", "order_id", id))?;
        order.status = status;
        Ok(order.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{PharmacyAccess, PharmacyModule};
    use super::*;
    use crate::adapters::memory::Database;
    use crate::domain::{EncounterId, PatientId, PractitionerId};
    use crate::modules::admission::EncounterClass;
    use crate::modules::testing::{clock, encounter, StubAdmission, StubIdentity};
    use rust_decimal_macros::dec;

    fn module() -> PharmacyModule {
        PharmacyModule::new(
            Arc::new(StubAdmission(vec![encounter(
                1,
                10,
                EncounterClass::Inpatient,
                EncounterStatus::InProgress,
            )])),
            Arc::new(StubIdentity {
                practitioners: vec![7],
                ..StubIdentity::default()
            }),
            "USD",
        )
    }

    fn amoxicillin(on_hand: u32) -> NewInventoryItem {
        NewInventoryItem {
            code: "amox500".to_string(),
            name: "Amoxicillin 500mg".to_string(),
            unit_cost: dec!(0.45),
            currency: None,
            quantity_on_hand: on_hand,
        }
    }

    fn order(code: &str, quantity: u32) -> NewMedicationOrder {
        NewMedicationOrder {
            encounter_id: EncounterId::new(1),
            item_code: code.to_string(),
            quantity,
            prescriber_id: Some(PractitionerId::new(7)),
            instructions: Some("1 capsule three times daily".to_string()),
        }
    }

    #[tokio::test]
    async fn test_catalog_codes_are_unique_ignoring_case() {
        let pharmacy = module();
        let db = Database::new();
        let ctx = RequestContext::at(clock());
        let mut tx = db.begin().await;

        let item = pharmacy
            .service
            .add_catalog_item(&ctx, &mut tx, amoxicillin(10))
            .await
            .unwrap();
        assert_eq!(item.code, "AMOX500");
        assert_eq!(item.currency, "USD");

        let err = pharmacy
            .service
            .add_catalog_item(
                &ctx,
                &mut tx,
                NewInventoryItem {
                    code: "AMOX500".to_string(),
                    ..amoxicillin(1)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::Conflict(_)));
        tx.commit();

        let pricing = pharmacy.access.get_item_pricing("Amox500").await.unwrap();
        assert_eq!(pricing.unit_cost, dec!(0.45));
    }

    #[tokio::test]
    async fn test_order_derives_patient_and_allows_uncatalogued_item() {
        let pharmacy = module();
        let db = Database::new();
        let ctx = RequestContext::at(clock());

        let mut tx = db.begin().await;
        let created = pharmacy
            .service
            .create_medication_order(&ctx, &mut tx, order("para1g", 2))
            .await
            .unwrap();
        tx.commit();

        assert_eq!(created.patient_id, PatientId::new(10));
        assert_eq!(created.item_code, "PARA1G");
        assert!(created.is_billable());
        assert!(!pharmacy.access.validate_item_exists("PARA1G").await);
        assert_eq!(
            pharmacy
                .access
                .get_encounter_requests(EncounterId::new(1))
                .await,
            vec![created]
        );
    }

    #[tokio::test]
    async fn test_order_rejects_bad_references() {
        let pharmacy = module();
        let db = Database::new();
        let ctx = RequestContext::at(clock());
        let mut tx = db.begin().await;

        let err = pharmacy
            .service
            .create_medication_order(
                &ctx,
                &mut tx,
                NewMedicationOrder {
                    encounter_id: EncounterId::new(2),
                    ..order("AMOX500", 1)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HospitalError::ReferencedEntityNotFound { ref field, .. } if field == "encounter_id"
        ));

        let err = pharmacy
            .service
            .create_medication_order(
                &ctx,
                &mut tx,
                NewMedicationOrder {
                    prescriber_id: Some(PractitionerId::new(99)),
                    ..order("AMOX500", 1)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HospitalError::ReferencedEntityNotFound { ref field, .. } if field == "prescriber_id"
        ));

        let err = pharmacy
            .service
            .create_medication_order(&ctx, &mut tx, order("AMOX500", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::Validation(_)));
    }

    #[tokio::test]
    async fn test_dispense_draws_stock() {
        let pharmacy = module();
        let db = Database::new();
        let ctx = RequestContext::at(clock());
        let mut tx = db.begin().await;

        pharmacy
            .service
            .add_catalog_item(&ctx, &mut tx, amoxicillin(5))
            .await
            .unwrap();
        let small = pharmacy
            .service
            .create_medication_order(&ctx, &mut tx, order("AMOX500", 3))
            .await
            .unwrap();
        let large = pharmacy
            .service
            .create_medication_order(&ctx, &mut tx, order("AMOX500", 3))
            .await
            .unwrap();

        let dispensed = pharmacy.service.dispense(&ctx, &mut tx, small.id).await.unwrap();
        assert_eq!(dispensed.status, MedicationOrderStatus::Dispensed);

        let err = pharmacy.service.dispense(&ctx, &mut tx, large.id).await.unwrap_err();
        assert!(matches!(
            err,
            HospitalError::InsufficientStock { requested: 3, available: 2, .. }
        ));

        pharmacy.service.restock(&ctx, &mut tx, "amox500", 10).await.unwrap();
        pharmacy.service.dispense(&ctx, &mut tx, large.id).await.unwrap();
        tx.commit();

        let item = pharmacy.access.get_inventory_item("AMOX500").await.unwrap();
        assert_eq!(item.quantity_on_hand, 9);
    }

    #[tokio::test]
    async fn test_billing_marks_and_releases() {
        let pharmacy = module();
        let db = Database::new();
        let ctx = RequestContext::at(clock());
        let invoice = InvoiceId::new(1);
        let mut tx = db.begin().await;

        let first = pharmacy
            .service
            .create_medication_order(&ctx, &mut tx, order("AMOX500", 1))
            .await
            .unwrap();
        let second = pharmacy
            .service
            .create_medication_order(&ctx, &mut tx, order("AMOX500", 1))
            .await
            .unwrap();

        pharmacy
            .service
            .mark_orders_billed(&ctx, &mut tx, &[first.id, second.id], invoice)
            .await
            .unwrap();
        let again = pharmacy
            .service
            .mark_orders_billed(&ctx, &mut tx, &[first.id], InvoiceId::new(2))
            .await
            .unwrap_err();
        assert!(matches!(again, HospitalError::Conflict(_)));

        let cancel = pharmacy
            .service
            .cancel_medication_order(&ctx, &mut tx, first.id)
            .await
            .unwrap_err();
        assert!(matches!(cancel, HospitalError::Conflict(_)));

        let released = pharmacy
            .service
            .release_billing(&ctx, &mut tx, invoice)
            .await
            .unwrap();
        assert_eq!(released, 2);

        let cancelled = pharmacy
            .service
            .cancel_medication_order(&ctx, &mut tx, first.id)
            .await
            .unwrap();
        assert!(!cancelled.is_billable());
        tx.commit();
    }
}
