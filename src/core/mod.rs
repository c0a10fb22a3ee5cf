//! Core orchestration for Wardhaven.
//!
//! # Modules
//!
//! - [`identifiers`] - Sequential (`WAH-2026-00042`) and dated (`ENC-20260314-4821`) identifiers
//! - [`events`] - Domain events published by module services
//! - [`orchestrator`] - Cross-module workflows driven by events and discharge completion
//! - [`hospital`] - The wired back-office: one transaction per write request
//!
//! # Write Workflow
//!
//! Every write request follows the same path:
//!
//! 1. **Begin**: take the record store's write gate
//! 2. **Validate**: the owning service checks references through other modules' accessors
//! 3. **Stage**: the service writes its own tables inside the transaction
//! 4. **Commit**: publish every staged table, or drop them all on error
//! 5. **Dispatch**: deliver the request's events, each in its own transaction
//!
//! # Example
//!
//! ```rust,no_run
//! use wardhaven::config::load_config;
//! use wardhaven::core::Hospital;
//! use wardhaven::domain::DischargeId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("wardhaven.toml")?;
//! let hospital = Hospital::from_config(&config).await?;
//!
//! let pending = hospital.discharge.access.get_discharge_summary(DischargeId::new(1)).await;
//! println!("{pending:?}");
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod hospital;
pub mod identifiers;
pub mod orchestrator;

pub use hospital::Hospital;
pub use orchestrator::{CareOrchestrator, CompletedDischarge};
