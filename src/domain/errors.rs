//! Domain error types
//!
//! This module defines the error hierarchy for Wardhaven. Write services return
//! these synchronously; read accessors never produce them for a lookup miss.

use rust_decimal::Decimal;
use thiserror::Error;

/// Main Wardhaven error type
///
/// This is the primary error type used throughout the library. The first six
/// variants form the write-path taxonomy shared by every module; the rest cover
/// ambient concerns (configuration, storage, I/O).
#[derive(Debug, Error)]
pub enum HospitalError {
    /// A required input was absent or blank
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A foreign reference failed validation through the owning module's accessor
    #[error("Referenced {entity} not found ({field} = {value})")]
    ReferencedEntityNotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// A state-machine rule was violated
    #[error("Invalid {entity} state transition: {from} -> {to}")]
    InvalidStateTransition {
        entity: String,
        from: String,
        to: String,
    },

    /// A uniqueness constraint rejected a generated identifier (retryable)
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// The billing module reports money outstanding for the encounter
    #[error("Financial clearance required for encounter {encounter_id}: outstanding balance {outstanding}")]
    FinancialClearanceRequired {
        encounter_id: i64,
        outstanding: Decimal,
    },

    /// Not enough stock on hand to dispense
    #[error("Insufficient stock for item {code}: requested {requested}, available {available}")]
    InsufficientStock {
        code: String,
        requested: u32,
        available: u32,
    },

    /// A record already exists where the operation requires none
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input failed a business rule that is not a missing field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage backend errors
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl HospitalError {
    /// Shorthand for [`HospitalError::MissingRequiredField`]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Shorthand for [`HospitalError::ReferencedEntityNotFound`]
    pub fn not_found(
        entity: impl Into<String>,
        field: impl Into<String>,
        value: impl std::fmt::Display,
    ) -> Self {
        Self::ReferencedEntityNotFound {
            entity: entity.into(),
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Shorthand for [`HospitalError::InvalidStateTransition`]
    pub fn transition(
        entity: impl Into<String>,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidStateTransition {
            entity: entity.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Whether a caller should retry the whole operation
    ///
    /// Only identifier collisions qualify: they come from the first-of-year
    /// sequence race or a random-suffix clash, and a fresh attempt resolves them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DuplicateIdentifier(_))
    }

    /// Stable machine-readable code for the error class
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::ReferencedEntityNotFound { .. } => "referenced_entity_not_found",
            Self::InvalidStateTransition { .. } => "invalid_state_transition",
            Self::DuplicateIdentifier(_) => "duplicate_identifier",
            Self::FinancialClearanceRequired { .. } => "financial_clearance_required",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::Database(_) => "database",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

impl From<std::io::Error> for HospitalError {
    fn from(err: std::io::Error) -> Self {
        HospitalError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HospitalError {
    fn from(err: serde_json::Error) -> Self {
        HospitalError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for HospitalError {
    fn from(err: toml::de::Error) -> Self {
        HospitalError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_names_field() {
        let err = HospitalError::not_found("patient", "patient_id", "WAH-2026-00042");
        let msg = err.to_string();
        assert!(msg.contains("patient_id"));
        assert!(msg.contains("WAH-2026-00042"));
    }

    #[test]
    fn test_only_duplicate_identifier_is_retryable() {
        assert!(HospitalError::DuplicateIdentifier("WAH-2026-00001".into()).is_retryable());
        assert!(!HospitalError::missing("first_name").is_retryable());
        assert!(!HospitalError::transition("encounter", "finished", "arrived").is_retryable());
        assert!(!HospitalError::Database("boom".into()).is_retryable());
    }

    #[test]
    fn test_financial_clearance_display() {
        let err = HospitalError::FinancialClearanceRequired {
            encounter_id: 7,
            outstanding: Decimal::new(4250, 2),
        };
        assert_eq!(
            err.to_string(),
            "Financial clearance required for encounter 7: outstanding balance 42.50"
        );
        assert_eq!(err.code(), "financial_clearance_required");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HospitalError = io_err.into();
        assert!(matches!(err, HospitalError::Io(_)));
    }
}
