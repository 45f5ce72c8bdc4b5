//! Configuration management for the Rowbox CLI
//!
//! Handles CLI settings like server URL, project, and upload limits.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Default Rowbox server URL when not specified via environment variable.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Default single-upload size ceiling (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Rowbox server URL
    pub server_url: String,

    /// Project uploads and listings operate on
    #[serde(default)]
    pub project_id: Option<Uuid>,

    /// Size ceiling for a single upload, in bytes
    pub max_upload_bytes: u64,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Load config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine; only load errors in an existing one
        // are worth surfacing, and even those shouldn't block the CLI.
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(url) = std::env::var("ROWBOX_SERVER_URL") {
            config.server_url = url;
        }
        if let Ok(project) = std::env::var("ROWBOX_PROJECT_ID") {
            config.project_id = Some(project.parse().map_err(|_| {
                crate::error::CliError::config(format!(
                    "ROWBOX_PROJECT_ID is not a valid UUID: '{}'",
                    project
                ))
            })?);
        }
        if let Ok(max) = std::env::var("ROWBOX_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = max.parse().map_err(|_| {
                crate::error::CliError::config(format!(
                    "ROWBOX_MAX_UPLOAD_BYTES is not a number: '{}'",
                    max
                ))
            })?;
        }

        Ok(config)
    }

    /// Get the server URL
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Set the server URL
    pub fn set_server_url(&mut self, url: String) {
        self.server_url = url;
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            project_id: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            verbose: false,
        }
    }
}
