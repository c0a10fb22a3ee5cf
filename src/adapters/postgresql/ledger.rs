//! PostgreSQL identifier ledger
//!
//! Reserving an identifier runs in one transaction:
//!
//! 1. `SELECT ... FOR UPDATE` locks every row of the partition,
//! 2. the greatest identifier is handed to the caller's builder,
//! 3. the new row is inserted and the transaction commits.
//!
//! A partition with no rows has nothing to lock, so two writers issuing the
//! first identifier of a year can both compute `...-00001`. The primary key
//! rejects the second insert and the caller retries.

use super::client::PostgreSQLClient;
use crate::adapters::database::traits::{identifier_order, NextIdentifier, SequenceLedger};
use crate::domain::{HospitalError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::error::SqlState;

const SELECT_PARTITION: &str = "SELECT identifier FROM identifier_ledger \
     WHERE prefix = $1 \
     ORDER BY length(identifier) DESC, identifier DESC \
     FOR UPDATE";

const INSERT_IDENTIFIER: &str =
    "INSERT INTO identifier_ledger (identifier, prefix) VALUES ($1, $2)";

const COUNT_PARTITION: &str = "SELECT COUNT(*) FROM identifier_ledger WHERE prefix = $1";

/// Ledger stored in the `identifier_ledger` table
pub struct PostgresSequenceLedger {
    client: Arc<PostgreSQLClient>,
}

impl PostgresSequenceLedger {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn new_with_arc(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }
}

fn database_error(action: &str, e: tokio_postgres::Error) -> HospitalError {
    HospitalError::Database(format!("{action}: {e}"))
}

#[async_trait]
impl SequenceLedger for PostgresSequenceLedger {
    async fn reserve(&self, partition: &str, next: NextIdentifier<'_>) -> Result<String> {
        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| database_error("Failed to begin transaction", e))?;

        tx.batch_execute(&self.client.statement_timeout_sql())
            .await
            .map_err(|e| database_error("Failed to set statement timeout", e))?;

        let rows = tx
            .query(SELECT_PARTITION, &[&partition])
            .await
            .map_err(|e| database_error("Failed to lock identifier partition", e))?;

        // SQL ordering is only a hint; pick the greatest the same way the memory ledger does
        let greatest = rows
            .iter()
            .map(|row| row.get::<_, String>(0))
            .max_by(|a, b| identifier_order(a, b));

        let candidate = next(greatest.as_deref())?;

        match tx.execute(INSERT_IDENTIFIER, &[&candidate, &partition]).await {
            Ok(_) => {}
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                return Err(HospitalError::DuplicateIdentifier(candidate));
            }
            Err(e) => return Err(database_error("Failed to store identifier", e)),
        }

        tx.commit()
            .await
            .map_err(|e| database_error("Failed to commit identifier", e))?;

        tracing::debug!(partition = %partition, identifier = %candidate, "Identifier reserved");
        Ok(candidate)
    }

    async fn issued_count(&self, partition: &str) -> Result<usize> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_one(COUNT_PARTITION, &[&partition])
            .await
            .map_err(|e| database_error("Failed to count identifiers", e))?;
        let count: i64 = row.get(0);
        usize::try_from(count)
            .map_err(|_| HospitalError::Database(format!("Invalid identifier count {count}")))
    }

    fn backend_name(&self) -> &str {
        "postgresql"
    }
}
