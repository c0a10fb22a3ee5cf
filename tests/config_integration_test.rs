//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` so they do not
//! interfere with each other.

use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use wardhaven::config::{load_config, Environment, LedgerBackend};

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("WARDHAVEN_APPLICATION_LOG_LEVEL");
    std::env::remove_var("WARDHAVEN_IDENTIFIERS_PATIENT_PREFIX");
    std::env::remove_var("WARDHAVEN_IDENTIFIERS_MAX_RETRIES");
    std::env::remove_var("WARDHAVEN_LEDGER_BACKEND");
    std::env::remove_var("WARDHAVEN_BILLING_CURRENCY");
    std::env::remove_var("WARDHAVEN_DISCHARGE_ENFORCE_CHECKLIST");
    std::env::remove_var("TEST_WARDHAVEN_PG_PASSWORD");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_WARDHAVEN_PG_PASSWORD", "s3cret");

    let file = write_config(
        r#"
environment = "staging"

[application]
name = "wardhaven-north"
log_level = "debug"

[identifiers]
patient_prefix = "NTH"
invoice_prefix = "BIL"
encounter_prefix = "VIS"
procedure_prefix = "OPS"
sequence_width = 6
max_retries = 5
random_attempts = 20

[ledger]
backend = "postgresql"

[postgresql]
connection_string = "postgresql://wardhaven:${TEST_WARDHAVEN_PG_PASSWORD}@db:5432/wardhaven"
max_connections = 8
ssl_mode = "require"

[billing]
currency = "eur"

[discharge]
enforce_checklist = true

[logging]
local_enabled = true
local_path = "/tmp/wardhaven"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    cleanup_env_vars();

    assert_eq!(config.environment, Environment::Staging);
    assert_eq!(config.application.name, "wardhaven-north");
    assert_eq!(config.identifiers.patient_prefix, "NTH");
    assert_eq!(config.identifiers.sequence_width, 6);
    assert_eq!(config.identifiers.random_attempts, 20);
    assert_eq!(config.ledger.backend, LedgerBackend::PostgreSQL);
    let pg = config.postgresql.as_ref().unwrap();
    assert!(pg
        .connection_string
        .expose_secret()
        .as_ref()
        .contains(":s3cret@"));
    assert_eq!(pg.max_connections, 8);
    assert!(config.discharge.enforce_checklist);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_empty_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("");
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.identifiers.patient_prefix, "WAH");
    assert_eq!(config.identifiers.invoice_prefix, "INV");
    assert_eq!(config.identifiers.encounter_prefix, "ENC");
    assert_eq!(config.identifiers.procedure_prefix, "PROC");
    assert_eq!(config.identifiers.sequence_width, 5);
    assert_eq!(config.identifiers.max_retries, 3);
    assert_eq!(config.identifiers.random_attempts, 10);
    assert_eq!(config.ledger.backend, LedgerBackend::Memory);
    assert_eq!(config.billing.currency, "USD");
    assert!(!config.discharge.enforce_checklist);
}

#[test]
fn test_env_overrides_apply_after_parsing() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("WARDHAVEN_IDENTIFIERS_PATIENT_PREFIX", "STB");
    std::env::set_var("WARDHAVEN_BILLING_CURRENCY", "GBP");
    std::env::set_var("WARDHAVEN_DISCHARGE_ENFORCE_CHECKLIST", "true");

    let file = write_config(
        r#"
[identifiers]
patient_prefix = "WAH"

[billing]
currency = "USD"
"#,
    );
    let result = load_config(file.path());
    cleanup_env_vars();

    let config = result.unwrap();
    assert_eq!(config.identifiers.patient_prefix, "STB");
    assert_eq!(config.billing.currency, "GBP");
    assert!(config.discharge.enforce_checklist);
}

#[test]
fn test_invalid_env_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("WARDHAVEN_IDENTIFIERS_MAX_RETRIES", "several");

    let file = write_config("");
    let result = load_config(file.path());
    cleanup_env_vars();

    let err = result.unwrap_err();
    assert_eq!(err.code(), "configuration");
    assert!(err.to_string().contains("WARDHAVEN_IDENTIFIERS_MAX_RETRIES"));
}

#[test]
fn test_unset_placeholder_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[ledger]
backend = "postgresql"

[postgresql]
connection_string = "postgresql://wardhaven:${TEST_WARDHAVEN_PG_PASSWORD}@db:5432/wardhaven"
"#,
    );
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_WARDHAVEN_PG_PASSWORD"));
}

#[test]
fn test_production_refuses_memory_ledger() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("environment = \"production\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("not allowed in production"));
}
