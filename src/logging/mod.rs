//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - console output for operators
//! - optional JSON file output with daily or hourly rotation
//! - one span per write request, carrying its correlation id
//!
//! # Example
//!
//! ```no_run
//! use wardhaven::logging::init_logging;
//! use wardhaven::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a write that a service rejected
///
/// # Example
///
/// ```no_run
/// use wardhaven::log_write_rejected;
/// use wardhaven::domain::HospitalError;
///
/// let error = HospitalError::missing("first_name");
/// log_write_rejected!("register_patient", &error);
/// ```
#[macro_export]
macro_rules! log_write_rejected {
    ($operation:expr, $error:expr) => {
        ::tracing::warn!(
            operation = $operation,
            error_code = $error.code(),
            error = %$error,
            "Write rejected"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use wardhaven::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Duplicate identifier: WAH-2026-00001");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        ::tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use wardhaven::log_error_with_context;
/// use wardhaven::domain::HospitalError;
///
/// let error = HospitalError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        ::tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::HospitalError;

    #[test]
    fn test_macros_expand_with_domain_errors() {
        let error = HospitalError::transition("encounter", "finished", "arrived");
        log_write_rejected!("update_encounter_status", &error);
        log_retry_attempt!(1usize, 3usize, &error);
        log_error_with_context!(&error, "walkthrough");
    }
}
