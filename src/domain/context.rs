//! Error context extension trait
//!
//! Provides `.context()` / `.with_context()` for `Result<T, E>` where `E` converts
//! into [`HospitalError`]. Infrastructure errors (configuration, storage, I/O)
//! get the context prepended to their message while keeping their variant.
//! Write-path errors (`ReferencedEntityNotFound`, `InvalidStateTransition`, …)
//! pass through untouched so callers can still match on them.
//!
//! # Examples
//!
//! ```rust
//! use wardhaven::domain::Result;
//! use wardhaven::domain::context::ResultExt;
//!
//! fn read_file(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| format!("Failed to read file: {}", path))
//! }
//! ```

use crate::domain::errors::HospitalError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure (evaluated only on error)
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

fn attach(err: HospitalError, context: impl std::fmt::Display) -> HospitalError {
    match err {
        HospitalError::Configuration(msg) => {
            HospitalError::Configuration(format!("{context}: {msg}"))
        }
        HospitalError::Database(msg) => HospitalError::Database(format!("{context}: {msg}")),
        HospitalError::Serialization(msg) => {
            HospitalError::Serialization(format!("{context}: {msg}"))
        }
        HospitalError::Io(msg) => HospitalError::Io(format!("{context}: {msg}")),
        HospitalError::Other(msg) => HospitalError::Other(format!("{context}: {msg}")),
        domain => domain,
    }
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<HospitalError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| attach(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| attach(e.into(), f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_context_keeps_infrastructure_variant() {
        let result: Result<()> = Err(HospitalError::Database("connection reset".to_string()));
        let err = result.context("Failed to reserve identifier").unwrap_err();

        assert!(matches!(err, HospitalError::Database(_)));
        let msg = err.to_string();
        assert!(msg.contains("Failed to reserve identifier"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_context_passes_domain_errors_through() {
        let result: Result<()> = Err(HospitalError::not_found("patient", "patient_id", 9));
        let err = result.context("creating encounter").unwrap_err();

        match err {
            HospitalError::ReferencedEntityNotFound { field, .. } => {
                assert_eq!(field, "patient_id")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_with_context_is_lazy() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let result: Result<i32> = Ok(42);
        let value = result
            .with_context(|| {
                called_clone.store(true, Ordering::SeqCst);
                "never built"
            })
            .unwrap();

        assert_eq!(value, 42);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_io_error_with_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let result: std::result::Result<(), std::io::Error> = Err(io_error);
        let err = result
            .context("Failed to read configuration file 'wardhaven.toml'")
            .unwrap_err();

        assert!(matches!(err, HospitalError::Io(_)));
        assert!(err.to_string().contains("wardhaven.toml"));
    }
}
