//! Rowbox CLI Library
//!
//! Command-line interface for the Rowbox ingestion pipeline.
//!
//! # Overview
//!
//! The Rowbox CLI drives tabular files through the full ingestion pipeline:
//!
//! - **Upload**: Send a CSV/XLSX file through upload, schema reconciliation,
//!   column mapping, and activation (`rowbox upload`)
//! - **Status Checking**: Inspect a file's ingestion status (`rowbox status`)
//! - **File Listing**: List uploaded files in a project (`rowbox files`)
//! - **Schema Inspection**: Show the project's schemas (`rowbox schema`)
//! - **Retry**: Re-attempt ingestion of an oversized file (`rowbox retry`)
//! - **Error Log**: Show a file's server-side error log (`rowbox errors`)

pub mod commands;
pub mod config;
pub mod error;
pub mod parser;
pub mod progress;
pub mod prompt;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use rowbox_common::logging::{LogConfig, LogLevel, LogOutput};
use std::path::PathBuf;
use uuid::Uuid;

/// Resolve the logging configuration for a CLI invocation.
///
/// Starts from the CLI defaults (warnings-only console output, so progress
/// rendering owns stdout), layers `LOG_*` environment overrides on top, and
/// finally lets an explicit `--verbose` win over everything.
pub fn resolve_log_config(verbose: bool) -> LogConfig {
    let base = LogConfig::builder()
        .level(if verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("rowbox-cli")
        .build();

    let mut config = base.clone().with_env_overrides().unwrap_or(base);
    if verbose {
        config.level = LogLevel::Debug;
    }
    config
}

/// Rowbox - Tabular File Ingestion Pipeline
#[derive(Parser, Debug)]
#[command(name = "rowbox")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server URL
    #[arg(long, env = "ROWBOX_SERVER_URL", default_value = "http://localhost:8000", global = true)]
    pub server_url: String,

    /// Project to operate on
    #[arg(long, env = "ROWBOX_PROJECT_ID", global = true)]
    pub project_id: Option<Uuid>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a tabular file and run it through the ingestion pipeline
    Upload {
        /// Path to the CSV or XLSX file
        path: PathBuf,

        /// Accept mapping suggestions without prompting; unmatched columns
        /// are added to the schema
        #[arg(short, long)]
        yes: bool,

        /// Do not wait for activation to complete
        #[arg(long)]
        no_wait: bool,
    },

    /// Show the ingestion status of a file
    Status {
        /// File identifier
        file_id: Uuid,

        /// Keep polling until the file reaches a terminal state
        #[arg(short, long)]
        watch: bool,
    },

    /// List uploaded files
    Files,

    /// Inspect project schemas
    Schema {
        #[command(subcommand)]
        command: SchemaCommand,
    },

    /// Re-attempt ingestion of a file the server declared too large
    Retry {
        /// File identifier
        file_id: Uuid,
    },

    /// Show the server-side error log for a file
    Errors {
        /// File identifier
        file_id: Uuid,
    },
}

/// Schema inspection subcommands
#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Show the active schema's columns
    Show,

    /// List all schemas in the project
    List,
}
