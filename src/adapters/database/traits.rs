//! Storage abstraction traits
//!
//! This module defines the traits that identifier-ledger backends must implement.

use crate::domain::Result;
use async_trait::async_trait;

/// Computes the next identifier from the greatest one already issued
///
/// Receives `None` when the partition is still empty.
pub type NextIdentifier<'a> = &'a (dyn Fn(Option<&str>) -> Result<String> + Send + Sync);

/// Ledger of issued sequential identifiers
///
/// Backends guarantee two things:
///
/// - while `reserve` runs, no other writer can read the same partition's
///   greatest identifier (row locks in PostgreSQL, a mutex in memory),
/// - an identifier is stored at most once; a second insert of the same value
///   fails with [`HospitalError::DuplicateIdentifier`](crate::domain::HospitalError).
#[async_trait]
pub trait SequenceLedger: Send + Sync {
    /// Reserve the next identifier in a partition
    ///
    /// Within one backend transaction: lock every identifier starting with
    /// `partition`, hand the greatest to `next`, store the result.
    ///
    /// # Arguments
    ///
    /// * `partition` - Identifier prefix including the year, e.g. `WAH-2026-`
    /// * `next` - Builds the new identifier from the greatest issued one
    ///
    /// # Errors
    ///
    /// Returns `DuplicateIdentifier` if a concurrent writer stored the same value
    /// first, or a `Database` error if the backend fails.
    async fn reserve(&self, partition: &str, next: NextIdentifier<'_>) -> Result<String>;

    /// Number of identifiers issued in a partition
    async fn issued_count(&self, partition: &str) -> Result<usize>;

    /// Backend name for logs
    fn backend_name(&self) -> &str;
}

/// Orders identifiers the way the ledger picks "greatest"
///
/// Longer identifiers win so that a sequence that outgrew its zero padding
/// (`…-100000` after `…-99999`) still counts as the latest.
pub fn identifier_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
