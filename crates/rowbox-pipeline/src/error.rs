//! Error types for the ingestion pipeline
//!
//! The taxonomy distinguishes load-bearing failures (validation,
//! transmission, persistence, activation), which propagate to the caller,
//! from best-effort failures (schema fetch, header extraction, status
//! polling), which the pipeline catches locally and replaces with a safe
//! default.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline step identifier, attached to `file:error` events so observers
/// can tell which part of the pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    Transmission,
    HeaderExtraction,
    SchemaReconciliation,
    MappingCommit,
    Activation,
    Polling,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::Transmission => "transmission",
            Stage::HeaderExtraction => "header_extraction",
            Stage::SchemaReconciliation => "schema_reconciliation",
            Stage::MappingCommit => "mapping_commit",
            Stage::Activation => "activation",
            Stage::Polling => "polling",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Comprehensive error type for the ingestion pipeline
///
/// Messages are user-facing and actionable where possible.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// File rejected before any network call (size or type limit)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The server matched the fingerprint to an existing file. Informational:
    /// the pipeline continues against the existing file id.
    #[error("Duplicate file detected: matches existing file {0}")]
    DuplicateDetected(Uuid),

    /// HTTP transport failure
    #[error("Network request failed: {0}. Check your connection and the server URL.")]
    Transport(#[from] reqwest::Error),

    /// Server answered with an application-level error
    #[error("Server error: {0}")]
    Api(String),

    /// Schema listing failed (best-effort step; callers degrade to "no schema")
    #[error("Failed to fetch schemas: {0}")]
    SchemaFetch(String),

    /// Header extraction failed (recoverable; callers fall back to synthetic columns)
    #[error("Header extraction failed: {0}")]
    HeaderExtraction(String),

    /// Persisting schema changes failed (load-bearing)
    #[error("Failed to persist schema changes: {0}")]
    SchemaPersist(String),

    /// Persisting the column mapping failed (load-bearing)
    #[error("Failed to save column mapping: {0}")]
    MappingSave(String),

    /// The manual mapping prompt failed or was aborted
    #[error("Mapping prompt aborted: {0}. Re-run the upload to finish mapping the columns, or pass --yes to accept suggestions automatically.")]
    MappingPrompt(String),

    /// File activation failed (load-bearing)
    #[error("File activation failed: {0}")]
    Activation(String),

    /// The status watch exhausted its budget without observing a terminal
    /// state. Not surfaced as a failure; polling just stops.
    #[error("Ingestion did not reach a terminal state within the polling budget")]
    ProcessingTimeout,

    /// Server declared the file too large for standard ingestion. Retry
    /// explicitly with `retry_ingestion` to use large-file batch settings.
    #[error("File {0} exceeds the server's standard ingestion limit. Retry ingestion to re-attempt with large-file settings.")]
    TooLarge(Uuid),

    /// File system operation failed
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Create an API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a schema persistence error
    pub fn schema_persist(msg: impl Into<String>) -> Self {
        Self::SchemaPersist(msg.into())
    }

    /// Create a mapping save error
    pub fn mapping_save(msg: impl Into<String>) -> Self {
        Self::MappingSave(msg.into())
    }

    /// Create a mapping prompt error
    pub fn mapping_prompt(msg: impl Into<String>) -> Self {
        Self::MappingPrompt(msg.into())
    }

    /// Create an activation error
    pub fn activation(msg: impl Into<String>) -> Self {
        Self::Activation(msg.into())
    }

    /// Whether the error leaves the pipeline in a retryable state for the
    /// user (as opposed to a pre-transmission rejection).
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PipelineError::Validation(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Validation.as_str(), "validation");
        assert_eq!(Stage::MappingCommit.as_str(), "mapping_commit");
        assert_eq!(Stage::Polling.to_string(), "polling");
    }

    #[test]
    fn test_mapping_prompt_error_suggests_yes_flag() {
        let message = PipelineError::mapping_prompt("stdin closed").to_string();
        assert!(message.contains("stdin closed"));
        assert!(message.contains("--yes"));
    }

    #[test]
    fn test_validation_is_not_retryable() {
        assert!(!PipelineError::validation("too big").is_retryable());
        assert!(PipelineError::api("boom").is_retryable());
    }
}
