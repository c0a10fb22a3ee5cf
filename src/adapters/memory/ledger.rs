//! In-memory identifier ledger

use crate::adapters::database::traits::{identifier_order, NextIdentifier, SequenceLedger};
use crate::domain::{HospitalError, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio::sync::Mutex;

/// Ledger kept in process memory
///
/// The mutex stands in for the row locks a relational backend takes, so writers
/// in one process never compute the same sequence number.
#[derive(Default)]
pub struct MemorySequenceLedger {
    issued: Mutex<BTreeSet<String>>,
}

impl MemorySequenceLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an identifier as if another writer had issued it
    ///
    /// Returns `false` if it was already present.
    pub async fn record(&self, identifier: impl Into<String>) -> bool {
        self.issued.lock().await.insert(identifier.into())
    }
}

#[async_trait]
impl SequenceLedger for MemorySequenceLedger {
    async fn reserve(&self, partition: &str, next: NextIdentifier<'_>) -> Result<String> {
        let mut issued = self.issued.lock().await;

        let greatest = issued
            .range(partition.to_string()..)
            .take_while(|id| id.starts_with(partition))
            .max_by(|a, b| identifier_order(a, b))
            .cloned();

        let candidate = next(greatest.as_deref())?;
        if !issued.insert(candidate.clone()) {
            return Err(HospitalError::DuplicateIdentifier(candidate));
        }

        tracing::debug!(partition = %partition, identifier = %candidate, "Identifier reserved");
        Ok(candidate)
    }

    async fn issued_count(&self, partition: &str) -> Result<usize> {
        let issued = self.issued.lock().await;
        Ok(issued
            .range(partition.to_string()..)
            .take_while(|id| id.starts_with(partition))
            .count())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
