//! Bounded hospital modules
//!
//! Every module owns private tables and publishes two surfaces:
//!
//! - a read **accessor** trait (`IdentityAccess`, `AdmissionAccess`, …) that
//!   returns plain summary records and never fails on a miss,
//! - a write **service** that is the only code able to change the module's
//!   records, validating foreign references through other modules' accessors.
//!
//! No module reads another module's tables.

pub mod admission;
pub mod billing;
pub mod discharge;
pub mod identity;
pub mod laboratory;
pub mod monitoring;
pub mod pharmacy;

#[cfg(test)]
pub(crate) mod testing;
