//! Human-readable identifier generation
//!
//! Two formats are issued:
//!
//! - **Sequential**, `<PREFIX>-<YEAR>-<NNNNN>` (patients, invoices). The sequence
//!   restarts every calendar year. Numbers are allocated through a
//!   [`SequenceLedger`], which serializes writers within a year. The first
//!   identifier of a year has nothing to lock, so two writers can collide; the
//!   ledger's uniqueness check rejects one with `DuplicateIdentifier` and
//!   [`SequentialIdGenerator`] retries it.
//! - **Dated random**, `<PREFIX>-<YYYYMMDD>-<6 HEX>` (encounters, procedures).
//!   No lock: a candidate is regenerated until the caller reports it unused.

use crate::adapters::database::SequenceLedger;
use crate::config::IdentifierConfig;
use crate::domain::{HospitalError, RequestContext, Result};
use crate::log_retry_attempt;
use chrono::NaiveDate;
use rand::Rng;
use std::sync::Arc;

/// Allocates year-partitioned sequential identifiers
#[derive(Clone)]
pub struct SequentialIdGenerator {
    ledger: Arc<dyn SequenceLedger>,
    width: usize,
    max_retries: usize,
}

impl SequentialIdGenerator {
    /// Creates a generator using the configured sequence width and retry limit
    pub fn new(ledger: Arc<dyn SequenceLedger>, config: &IdentifierConfig) -> Self {
        Self {
            ledger,
            width: config.sequence_width,
            max_retries: config.max_retries,
        }
    }

    /// Next identifier for `prefix` in the request's calendar year
    pub async fn next(&self, ctx: &RequestContext, prefix: &str) -> Result<String> {
        self.next_for_year(prefix, ctx.year()).await
    }

    /// Next identifier for `prefix` in `year`
    ///
    /// # Errors
    ///
    /// Returns `DuplicateIdentifier` once `max_retries` retries are exhausted, or
    /// any non-retryable ledger error immediately.
    pub async fn next_for_year(&self, prefix: &str, year: i32) -> Result<String> {
        let partition = partition_prefix(prefix, year);
        let width = self.width;
        let build = |greatest: Option<&str>| next_in_sequence(&partition, greatest, width);

        let mut attempt = 0;
        loop {
            match self.ledger.reserve(&partition, &build).await {
                Ok(identifier) => {
                    tracing::debug!(
                        identifier = %identifier,
                        backend = self.ledger.backend_name(),
                        attempts = attempt + 1,
                        "Sequential identifier issued"
                    );
                    return Ok(identifier);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    log_retry_attempt!(attempt, self.max_retries, &e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Ledger backing this generator
    pub fn ledger(&self) -> &Arc<dyn SequenceLedger> {
        &self.ledger
    }
}

/// `WAH` + 2026 gives `WAH-2026-`
pub fn partition_prefix(prefix: &str, year: i32) -> String {
    format!("{prefix}-{year}-")
}

/// Parses the trailing sequence number of an identifier in `partition`
pub fn parse_sequence(partition: &str, identifier: &str) -> Result<u64> {
    identifier
        .strip_prefix(partition)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            HospitalError::Validation(format!(
                "Identifier '{identifier}' does not belong to sequence '{partition}'"
            ))
        })
}

/// Formats the identifier following `greatest`, or the first one if `None`
///
/// A sequence that outgrows `width` keeps counting with more digits.
pub fn next_in_sequence(partition: &str, greatest: Option<&str>, width: usize) -> Result<String> {
    let next = match greatest {
        Some(identifier) => parse_sequence(partition, identifier)? + 1,
        None => 1,
    };
    Ok(format!("{partition}{next:0width$}"))
}

/// Six uppercase hex digits
pub fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:06X}", rng.gen_range(0..=0xFF_FFFFu32))
}

/// `ENC` + 2026-03-14 + `3FA2C1` gives `ENC-20260314-3FA2C1`
pub fn dated_identifier(prefix: &str, date: NaiveDate, suffix: &str) -> String {
    format!("{prefix}-{}-{suffix}", date.format("%Y%m%d"))
}

/// Draws dated identifiers until `is_taken` reports one unused
///
/// # Errors
///
/// Returns `DuplicateIdentifier` with the last candidate after `attempts` draws.
pub fn generate_unique_dated<R, F>(
    prefix: &str,
    date: NaiveDate,
    attempts: usize,
    rng: &mut R,
    is_taken: F,
) -> Result<String>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    let mut last = None;
    for _ in 0..attempts.max(1) {
        let candidate = dated_identifier(prefix, date, &random_suffix(rng));
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
        tracing::debug!(candidate = %candidate, "Dated identifier already taken, regenerating");
        last = Some(candidate);
    }
    Err(HospitalError::DuplicateIdentifier(
        last.unwrap_or_else(|| prefix.to_string()),
    ))
}
