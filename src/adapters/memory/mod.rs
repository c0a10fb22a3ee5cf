//! In-memory storage backend
//!
//! The default backend for the record store and the identifier ledger.

pub mod ledger;
pub mod store;

pub use ledger::MemorySequenceLedger;
pub use store::{Database, RecordSet, Table, Transaction, View};
