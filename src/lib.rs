// Wardhaven - Hospital back-office
// Copyright (c) 2026 Wardhaven Contributors
// Licensed under the MIT License

//! # Wardhaven - Hospital back-office
//!
//! Wardhaven is a modular hospital back-office: patient registration, the
//! encounter lifecycle, vital signs, pharmacy and laboratory orders, invoicing
//! and a discharge workflow gated on financial clearance.
//!
//! ## Overview
//!
//! Each clinical or financial area is a module that owns its records and
//! exposes two surfaces:
//!
//! - **Accessor**: read-only, returns DTOs, never errors for "not found"
//! - **Write service**: the only way to change the module's records
//!
//! Modules refer to each other's records through typed ids
//! ([`domain::PatientId`], [`domain::EncounterId`], …) validated through the
//! owning module's accessor at write time.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Identifier generation, domain events, the wired [`core::Hospital`]
//! - [`modules`] - Identity, admission, monitoring, pharmacy, laboratory, billing, discharge
//! - [`adapters`] - In-memory record store and identifier ledger backends
//! - [`domain`] - Shared ids, errors, money helpers and request context
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wardhaven::config::load_config;
//! use wardhaven::core::Hospital;
//! use wardhaven::domain::RequestContext;
//! use wardhaven::modules::admission::{EncounterClass, NewEncounter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("wardhaven.toml")?;
//!     let hospital = Hospital::from_config(&config).await?;
//!     let ctx = RequestContext::new().with_actor("admissions-desk");
//!
//!     let encounter = hospital
//!         .admit(
//!             &ctx,
//!             NewEncounter {
//!                 patient_external_id: "WAH-2026-00001".to_string(),
//!                 class: EncounterClass::Inpatient,
//!                 status: None,
//!                 practitioner_id: None,
//!                 location_id: None,
//!                 organization_id: None,
//!                 reason: None,
//!             },
//!         )
//!         .await?;
//!
//!     println!("Admitted {}", encounter.external_id);
//!     Ok(())
//! }
//! ```
//!
//! ## Discharge Gatekeeper
//!
//! An inpatient encounter only reaches `finished` through a completed
//! discharge, and a discharge only completes once the encounter's invoices
//! are settled:
//!
//! ```rust,no_run
//! use wardhaven::core::Hospital;
//! use wardhaven::domain::{DischargeId, HospitalError, PractitionerId, RequestContext};
//!
//! # async fn example(hospital: &Hospital) {
//! let ctx = RequestContext::new();
//! match hospital
//!     .complete_discharge(&ctx, DischargeId::new(1), PractitionerId::new(7))
//!     .await
//! {
//!     Ok(done) => println!("Encounter {} finished", done.encounter.external_id),
//!     Err(HospitalError::FinancialClearanceRequired { outstanding, .. }) => {
//!         println!("{outstanding} still to pay");
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`domain::Result`], whose error is
//! [`domain::HospitalError`]. A failed write leaves no rows behind.
//!
//! ## Logging
//!
//! Wardhaven logs through `tracing`; each write runs inside a span carrying
//! the request's correlation id. See [`logging::init_logging`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod modules;
