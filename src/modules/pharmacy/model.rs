//! Inventory catalog and medication orders

use crate::domain::{
    EncounterId, HospitalError, InvoiceId, MedicationOrderId, PatientId, PractitionerId, Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request to add a catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub code: String,
    pub name: String,
    pub unit_cost: Decimal,
    /// Configured billing currency when omitted
    pub currency: Option<String>,
    #[serde(default)]
    pub quantity_on_hand: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemSummary {
    pub code: String,
    pub name: String,
    pub unit_cost: Decimal,
    pub currency: String,
    pub quantity_on_hand: u32,
}

/// Price of one catalog item, as billing sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPricing {
    pub code: String,
    pub name: String,
    pub unit_cost: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationOrderStatus {
    Active,
    Dispensed,
    Cancelled,
}

impl MedicationOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Dispensed => "dispensed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MedicationOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to prescribe an item for an encounter
///
/// The item code need not be catalogued; billing prices an unknown code at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicationOrder {
    pub encounter_id: EncounterId,
    pub item_code: String,
    pub quantity: u32,
    pub prescriber_id: Option<PractitionerId>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationOrderSummary {
    pub id: MedicationOrderId,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub item_code: String,
    pub quantity: u32,
    pub prescriber_id: Option<PractitionerId>,
    pub instructions: Option<String>,
    pub status: MedicationOrderStatus,
    /// Invoice this order is billed on, if any
    pub invoice_id: Option<InvoiceId>,
    pub ordered_at: DateTime<Utc>,
}

impl MedicationOrderSummary {
    /// Not cancelled and not yet on an invoice
    pub fn is_billable(&self) -> bool {
        self.status != MedicationOrderStatus::Cancelled && self.invoice_id.is_none()
    }
}

#[derive(Debug, Clone)]
pub(super) struct InventoryItem {
    pub code: String,
    pub name: String,
    pub unit_cost: Decimal,
    pub currency: String,
    pub quantity_on_hand: u32,
}

impl InventoryItem {
    pub fn take(&mut self, quantity: u32) -> Result<()> {
        if quantity > self.quantity_on_hand {
            return Err(HospitalError::InsufficientStock {
                code: self.code.clone(),
                requested: quantity,
                available: self.quantity_on_hand,
            });
        }
        self.quantity_on_hand -= quantity;
        Ok(())
    }

    pub fn pricing(&self) -> ItemPricing {
        ItemPricing {
            code: self.code.clone(),
            name: self.name.clone(),
            unit_cost: self.unit_cost,
            currency: self.currency.clone(),
        }
    }

    pub fn summary(&self) -> InventoryItemSummary {
        InventoryItemSummary {
            code: self.code.clone(),
            name: self.name.clone(),
            unit_cost: self.unit_cost,
            currency: self.currency.clone(),
            quantity_on_hand: self.quantity_on_hand,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct MedicationOrder {
    pub id: i64,
    pub encounter_id: EncounterId,
    pub patient_id: PatientId,
    pub item_code: String,
    pub quantity: u32,
    pub prescriber_id: Option<PractitionerId>,
    pub instructions: Option<String>,
    pub status: MedicationOrderStatus,
    pub invoice_id: Option<InvoiceId>,
    pub ordered_at: DateTime<Utc>,
}

impl MedicationOrder {
    pub fn summary(&self) -> MedicationOrderSummary {
        MedicationOrderSummary {
            id: MedicationOrderId::new(self.id),
            encounter_id: self.encounter_id,
            patient_id: self.patient_id,
            item_code: self.item_code.clone(),
            quantity: self.quantity,
            prescriber_id: self.prescriber_id,
            instructions: self.instructions.clone(),
            status: self.status,
            invoice_id: self.invoice_id,
            ordered_at: self.ordered_at,
        }
    }
}

/// Catalog code comparison key
pub(super) fn item_key(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
