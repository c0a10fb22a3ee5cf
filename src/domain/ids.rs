//! Typed record identifiers
//!
//! Every record carries a surrogate integer id. Cross-module references are stored
//! as these wrappers rather than raw integers so a `PatientId` can never be passed
//! where an `EncounterId` is expected. A wrapper says nothing about whether the
//! record still exists: validity is checked through the owning module's accessor
//! at write time and can go stale afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw surrogate id
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw surrogate id
            pub const fn value(self) -> i64 {
                self.0
            }

            /// Human-readable name of the referenced record kind
            pub const fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: i64 = s
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid {} id: '{}'", $label, s))?;
                if value <= 0 {
                    return Err(format!("{} id must be positive, got {}", $label, value));
                }
                Ok(Self(value))
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

record_id!(
    /// Identity module: organization
    OrganizationId,
    "organization"
);
record_id!(
    /// Identity module: physical location (ward, room, clinic)
    LocationId,
    "location"
);
record_id!(
    /// Identity module: practitioner
    PractitionerId,
    "practitioner"
);
record_id!(
    /// Identity module: patient
    PatientId,
    "patient"
);
record_id!(
    /// Admission module: encounter
    EncounterId,
    "encounter"
);
record_id!(ProcedureId, "procedure");
record_id!(ObservationId, "observation");
record_id!(MedicationOrderId, "medication order");
record_id!(LabOrderId, "lab order");
record_id!(DiagnosticReportId, "diagnostic report");
record_id!(InvoiceId, "invoice");
record_id!(InvoiceLineId, "invoice line");
record_id!(DischargeId, "discharge");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id = PatientId::from_str("42").unwrap();
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn test_parse_rejects_non_positive_and_garbage() {
        assert!(EncounterId::from_str("0").is_err());
        assert!(EncounterId::from_str("-3").is_err());
        let err = EncounterId::from_str("abc").unwrap_err();
        assert!(err.contains("encounter"));
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&InvoiceId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: InvoiceId = serde_json::from_str("7").unwrap();
        assert_eq!(back, InvoiceId::new(7));
    }
}
