//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Wardhaven configuration file.

use crate::config::load_config;
use crate::config::schema::LedgerBackend;
use crate::config::SecretString;
use clap::Args;
use secrecy::ExposeSecret;

/// Host part of a connection string, credentials dropped
fn connection_target(connection_string: &SecretString) -> &str {
    connection_string
        .expose_secret()
        .as_ref()
        .rsplit('@')
        .next()
        .unwrap_or("***")
}

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates, so any failure maps to the configuration
    /// exit code.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Application: {}", config.application.name);
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Patient IDs: {}-<year>-{}",
            config.identifiers.patient_prefix,
            "0".repeat(config.identifiers.sequence_width)
        );
        println!(
            "  Invoice IDs: {}-<year>-{}",
            config.identifiers.invoice_prefix,
            "0".repeat(config.identifiers.sequence_width)
        );

        match config.ledger.backend {
            LedgerBackend::Memory => println!("  Ledger: in-memory"),
            LedgerBackend::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    println!("  Ledger: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        connection_target(&pg_config.connection_string)
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
        }

        println!("  Currency: {}", config.billing.currency);
        println!(
            "  Discharge checklist: {}",
            if config.discharge.enforce_checklist {
                "enforced"
            } else {
                "advisory"
            }
        );
        println!();
        Ok(0)
    }
}
