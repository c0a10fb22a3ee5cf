//! Identifier ledger factory
//!
//! This module creates the ledger backend selected in configuration.

use crate::adapters::database::traits::SequenceLedger;
use crate::adapters::memory::MemorySequenceLedger;
use crate::adapters::postgresql::{PostgreSQLClient, PostgresSequenceLedger};
use crate::config::schema::{LedgerBackend, WardhavenConfig};
use crate::domain::{HospitalError, Result};
use std::sync::Arc;

/// Create the identifier ledger based on the configuration
///
/// The PostgreSQL backend also creates its table if missing.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or its schema cannot be created
pub async fn create_sequence_ledger(config: &WardhavenConfig) -> Result<Arc<dyn SequenceLedger>> {
    match config.ledger.backend {
        LedgerBackend::Memory => {
            tracing::info!("Creating in-memory identifier ledger");
            Ok(Arc::new(MemorySequenceLedger::new()) as Arc<dyn SequenceLedger>)
        }
        LedgerBackend::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                HospitalError::Configuration(
                    "postgresql configuration is required when ledger.backend = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL identifier ledger");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            client.test_connection().await?;
            client.ensure_schema().await?;

            Ok(Arc::new(PostgresSequenceLedger::new(client)) as Arc<dyn SequenceLedger>)
        }
    }
}
