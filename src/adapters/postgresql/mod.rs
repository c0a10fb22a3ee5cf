//! PostgreSQL integration
//!
//! Durable storage for the identifier ledger.

pub mod client;
pub mod ledger;

pub use client::PostgreSQLClient;
pub use ledger::PostgresSequenceLedger;
