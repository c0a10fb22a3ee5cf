//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Wardhaven using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Wardhaven - Hospital back-office
#[derive(Parser, Debug)]
#[command(name = "wardhaven")]
#[command(version, about, long_about = None)]
#[command(author = "Wardhaven Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "wardhaven.toml", env = "WARDHAVEN_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "WARDHAVEN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Run an admission-to-discharge scenario against the in-memory store
    Walkthrough(commands::walkthrough::WalkthroughArgs),
}
