//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{LedgerBackend, WardhavenConfig};
use crate::domain::errors::HospitalError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into WardhavenConfig
/// 4. Applies environment variable overrides (WARDHAVEN_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use wardhaven::config::loader::load_config;
///
/// let config = load_config("wardhaven.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<WardhavenConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(HospitalError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        HospitalError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_str(&contents)
}

/// Loads configuration from TOML text
///
/// Same pipeline as [`load_config`] without the file access.
pub fn load_config_str(contents: &str) -> Result<WardhavenConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: WardhavenConfig = toml::from_str(&contents)
        .map_err(|e| HospitalError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        HospitalError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| HospitalError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        // Placeholders in comments are left alone
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(HospitalError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        HospitalError::Configuration(format!("Invalid value '{value}' for {name}"))
    })
}

/// Applies environment variable overrides using WARDHAVEN_* prefix
///
/// Environment variables follow the pattern: WARDHAVEN_<SECTION>_<KEY>
/// For example: WARDHAVEN_LEDGER_BACKEND, WARDHAVEN_BILLING_CURRENCY
fn apply_env_overrides(config: &mut WardhavenConfig) -> Result<()> {
    const LOG_LEVEL: &str = "WARDHAVEN_APPLICATION_LOG_LEVEL";
    const MAX_RETRIES: &str = "WARDHAVEN_IDENTIFIERS_MAX_RETRIES";
    const LEDGER_BACKEND: &str = "WARDHAVEN_LEDGER_BACKEND";
    const PG_MAX_CONNECTIONS: &str = "WARDHAVEN_POSTGRESQL_MAX_CONNECTIONS";
    const ENFORCE_CHECKLIST: &str = "WARDHAVEN_DISCHARGE_ENFORCE_CHECKLIST";
    const LOCAL_ENABLED: &str = "WARDHAVEN_LOGGING_LOCAL_ENABLED";

    // Application overrides
    if let Ok(val) = std::env::var(LOG_LEVEL) {
        config.application.log_level = val;
    }

    // Identifier overrides
    if let Ok(val) = std::env::var("WARDHAVEN_IDENTIFIERS_PATIENT_PREFIX") {
        config.identifiers.patient_prefix = val;
    }
    if let Ok(val) = std::env::var("WARDHAVEN_IDENTIFIERS_INVOICE_PREFIX") {
        config.identifiers.invoice_prefix = val;
    }
    if let Ok(val) = std::env::var(MAX_RETRIES) {
        config.identifiers.max_retries = parse_override(MAX_RETRIES, &val)?;
    }

    // Ledger overrides
    if let Ok(val) = std::env::var(LEDGER_BACKEND) {
        config.ledger.backend = match val.to_ascii_lowercase().as_str() {
            "memory" => LedgerBackend::Memory,
            "postgresql" => LedgerBackend::PostgreSQL,
            other => {
                return Err(HospitalError::Configuration(format!(
                    "Invalid value '{other}' for {LEDGER_BACKEND}"
                )))
            }
        };
    }

    // PostgreSQL overrides (only if PostgreSQL is configured)
    if let Some(ref mut pg_config) = config.postgresql {
        if let Ok(val) = std::env::var("WARDHAVEN_POSTGRESQL_CONNECTION_STRING") {
            pg_config.connection_string = super::secret_string(val);
        }
        if let Ok(val) = std::env::var(PG_MAX_CONNECTIONS) {
            pg_config.max_connections = parse_override(PG_MAX_CONNECTIONS, &val)?;
        }
    }

    // Billing overrides
    if let Ok(val) = std::env::var("WARDHAVEN_BILLING_CURRENCY") {
        config.billing.currency = val;
    }

    // Discharge overrides
    if let Ok(val) = std::env::var(ENFORCE_CHECKLIST) {
        config.discharge.enforce_checklist = parse_override(ENFORCE_CHECKLIST, &val)?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var(LOCAL_ENABLED) {
        config.logging.local_enabled = parse_override(LOCAL_ENABLED, &val)?;
    }
    if let Ok(val) = std::env::var("WARDHAVEN_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
