//! Identifier ledger abstraction
//!
//! Backends (memory, PostgreSQL) implement [`SequenceLedger`]; the factory picks
//! one from configuration.

pub mod factory;
pub mod traits;

pub use factory::create_sequence_ledger;
pub use traits::{identifier_order, NextIdentifier, SequenceLedger};
