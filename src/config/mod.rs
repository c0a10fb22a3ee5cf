//! Configuration management for Wardhaven.
//!
//! # Overview
//!
//! Wardhaven uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `WARDHAVEN_<SECTION>_<KEY>` overrides
//! - Default values for every optional setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use wardhaven::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("wardhaven.toml")?;
//! println!("Patient prefix: {}", config.identifiers.patient_prefix);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application name and log level
//! - [`IdentifierConfig`] - Identifier prefixes, sequence width, retry limits
//! - [`LedgerConfig`] - Identifier ledger backend
//! - [`PostgreSQLConfig`] - PostgreSQL connection for the ledger
//! - [`BillingConfig`] - Invoice currency
//! - [`DischargeConfig`] - Discharge checklist enforcement
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [identifiers]
//! patient_prefix = "WAH"
//! invoice_prefix = "INV"
//!
//! [ledger]
//! backend = "postgresql"
//!
//! [postgresql]
//! connection_string = "${WARDHAVEN_PG_URL}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_str};
pub use schema::{
    ApplicationConfig, BillingConfig, DischargeConfig, Environment, IdentifierConfig,
    LedgerBackend, LedgerConfig, LoggingConfig, PostgreSQLConfig, WardhavenConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
