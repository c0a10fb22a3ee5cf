//! Domain types shared by every module.
//!
//! # Overview
//!
//! - **Typed identifiers** ([`PatientId`], [`EncounterId`], [`InvoiceId`], …)
//! - **Error types** ([`HospitalError`]) and the [`Result`] alias
//! - **Money helpers** ([`money`]) over `rust_decimal::Decimal`
//! - **Request context** ([`RequestContext`]) passed explicitly through writes
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so references to different modules cannot
//! be mixed:
//!
//! ```rust
//! use wardhaven::domain::{EncounterId, PatientId};
//!
//! let patient = PatientId::new(1);
//! let encounter = EncounterId::new(1);
//! // let wrong: PatientId = encounter; // Compile error!
//! # let _ = (patient, encounter);
//! ```

pub mod context;
pub mod errors;
pub mod ids;
pub mod money;
pub mod request;
pub mod result;
pub mod validate;

pub use errors::HospitalError;
pub use ids::{
    DiagnosticReportId, DischargeId, EncounterId, InvoiceId, InvoiceLineId, LabOrderId,
    LocationId, MedicationOrderId, ObservationId, OrganizationId, PatientId, PractitionerId,
    ProcedureId,
};
pub use request::RequestContext;
pub use result::Result;
