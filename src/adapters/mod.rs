//! Storage adapters for Wardhaven.
//!
//! - [`memory`] - Transactional in-memory record store and identifier ledger
//! - [`database`] - Identifier ledger trait and backend factory
//! - [`postgresql`] - PostgreSQL identifier ledger
//!
//! Modules keep their records in the memory store. Only the identifier ledger
//! has a durable backend, because identifier uniqueness must hold across
//! processes.

pub mod database;
pub mod memory;
pub mod postgresql;
