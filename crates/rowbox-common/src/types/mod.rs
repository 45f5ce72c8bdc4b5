//! Ingestion domain model shared across Rowbox
//!
//! These types mirror the wire shapes of the Rowbox platform API. All field
//! names serialize as snake_case to match the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// File Types
// ============================================================================

/// Supported tabular file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
    #[default]
    Unknown,
}

impl FileFormat {
    /// Derive the format from a filename extension.
    ///
    /// Extension is authoritative: browsers and other upload clients routinely
    /// misreport the XLSX MIME type, so callers should prefer this over any
    /// declared content type.
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit('.').next().map(|ext| ext.to_ascii_lowercase()) {
            Some(ext) if ext == "csv" => FileFormat::Csv,
            Some(ext) if ext == "xlsx" => FileFormat::Xlsx,
            _ => FileFormat::Unknown,
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Xlsx => write!(f, "xlsx"),
            FileFormat::Unknown => write!(f, "unknown"),
        }
    }
}

/// Lifecycle status of an uploaded file.
///
/// A file is only queryable once it reaches [`FileStatus::Active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    HeadersExtracted,
    Processing,
    Active,
    Error,
    TooLarge,
    Timeout,
}

impl FileStatus {
    /// Whether this status ends the ingestion pipeline for the file.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FileStatus::Active | FileStatus::Error | FileStatus::TooLarge | FileStatus::Timeout
        )
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileStatus::Pending => "pending",
            FileStatus::HeadersExtracted => "headers_extracted",
            FileStatus::Processing => "processing",
            FileStatus::Active => "active",
            FileStatus::Error => "error",
            FileStatus::TooLarge => "too_large",
            FileStatus::Timeout => "timeout",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for FileStatus {
    type Err = crate::RowboxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FileStatus::Pending),
            "headers_extracted" => Ok(FileStatus::HeadersExtracted),
            "processing" => Ok(FileStatus::Processing),
            "active" => Ok(FileStatus::Active),
            "error" => Ok(FileStatus::Error),
            "too_large" => Ok(FileStatus::TooLarge),
            "timeout" => Ok(FileStatus::Timeout),
            other => Err(crate::RowboxError::InvalidStatus(other.to_string())),
        }
    }
}

/// Live ingestion counters reported by the server while a file is processed.
///
/// Transient: each status poll overwrites the previous snapshot; no history
/// is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionProgress {
    pub processed: u64,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub percentage: Option<u8>,
    #[serde(default)]
    pub rows_per_second: f64,
    #[serde(default)]
    pub elapsed_seconds: f64,
    #[serde(default)]
    pub eta: Option<u64>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Deserialize `ingestion_progress` from either a JSON object or a JSON
/// string containing an object.
///
/// Older backend responses double-encode this field; normalizing here means
/// no downstream consumer has to care which form arrived.
fn progress_from_wire<'de, D>(deserializer: D) -> Result<Option<IngestionProgress>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Parsed(IngestionProgress),
        Raw(String),
    }

    match Option::<Wire>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Wire::Parsed(progress)) => Ok(Some(progress)),
        Some(Wire::Raw(raw)) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Server-side metadata attached to an uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Ordered column names extracted by the server, once available.
    #[serde(default)]
    pub columns: Option<Vec<String>>,

    /// Latest ingestion progress snapshot, if the file is being processed.
    #[serde(default, deserialize_with = "progress_from_wire")]
    pub ingestion_progress: Option<IngestionProgress>,
}

/// A file uploaded into a project, tracked from reception to activation.
///
/// Owned by the pipeline: only the upload coordinator and status poller
/// responses mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: Uuid,
    pub filename: String,
    pub size_bytes: i64,
    #[serde(default)]
    pub format: FileFormat,
    pub status: FileStatus,
    #[serde(default)]
    pub metadata: Option<FileMetadata>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub ingested_at: Option<DateTime<Utc>>,
}

impl UploadedFile {
    /// Column names extracted by the server, if any.
    pub fn columns(&self) -> Option<&[String]> {
        self.metadata
            .as_ref()
            .and_then(|m| m.columns.as_deref())
            .filter(|c| !c.is_empty())
    }

    /// Latest progress snapshot, if any.
    pub fn progress(&self) -> Option<&IngestionProgress> {
        self.metadata.as_ref().and_then(|m| m.ingestion_progress.as_ref())
    }
}

// ============================================================================
// Schema Types
// ============================================================================

/// Value type of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Integer,
    Numeric,
    Boolean,
    Timestamp,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Numeric => "numeric",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ColumnType {
    type Err = crate::RowboxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ColumnType::Text),
            "integer" | "int" => Ok(ColumnType::Integer),
            "numeric" | "number" => Ok(ColumnType::Numeric),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "timestamp" | "datetime" => Ok(ColumnType::Timestamp),
            other => Err(crate::RowboxError::InvalidColumnType(other.to_string())),
        }
    }
}

/// One column of a project schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl SchemaColumn {
    /// Create a plain text column, the default for auto-created schemas.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::Text,
            is_required: false,
            description: None,
        }
    }
}

/// The shared, evolving schema of a project.
///
/// Column names are unique within a schema; at most one schema per project is
/// active at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: Uuid,
    pub name: String,
    pub columns: Vec<SchemaColumn>,
    #[serde(default)]
    pub is_active: bool,
}

impl Schema {
    /// Ordered column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Exact, case-sensitive membership check.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Required columns that are not covered by the given mapped targets.
    pub fn uncovered_required<'a>(
        &'a self,
        mapped_targets: &BTreeMap<String, String>,
    ) -> Vec<&'a str> {
        self.columns
            .iter()
            .filter(|c| c.is_required)
            .filter(|c| !mapped_targets.values().any(|v| v == &c.name))
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// A committed file-column to schema-column mapping.
///
/// Immutable after save: re-mapping a file creates a new record rather than
/// mutating history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub file_id: Uuid,
    pub schema_id: Uuid,
    /// File column -> schema column, for every file column that resolved.
    pub mappings: BTreeMap<String, String>,
    /// Schema columns created as a side effect of committing this mapping.
    pub new_columns_added: usize,
}

// ============================================================================
// Error Reporting Types
// ============================================================================

/// A server-recorded error for a file. Append-only; the pipeline surfaces
/// these but never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub severity: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
