//! API request and response types
//!
//! Matches the Rowbox backend API structure. All payloads ride in the
//! standard `ApiResponse` envelope.

use rowbox_common::types::{FileError, FileFormat, SchemaColumn, UploadedFile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An outbound file transmission.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub format: FileFormat,
    /// Identity fingerprint for server-side duplicate suppression.
    pub fingerprint: String,
    pub project_id: Option<Uuid>,
}

/// Response from the upload endpoint.
///
/// `duplicate = true` means the fingerprint matched an existing file and no
/// new record was created; `file_id` then refers to the existing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub duplicate: bool,
    pub file_id: Uuid,
    #[serde(default)]
    pub files: Vec<UploadedFile>,
}

/// Response from the file status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStatusResponse {
    pub file: UploadedFile,
}

/// Response from the file listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesResponse {
    pub files: Vec<UploadedFile>,
}

/// Response from the schema listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemasResponse {
    pub schemas: Vec<rowbox_common::types::Schema>,
}

/// Request to create a schema with an initial column set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSchemaRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    pub columns: Vec<SchemaColumn>,
    pub is_active: bool,
}

/// Request to replace a schema's column set (append-only in practice: the
/// pipeline only ever sends the existing columns plus additions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSchemaRequest {
    pub columns: Vec<SchemaColumn>,
}

/// Data payload confirming a saved column mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingSaved {
    pub new_columns_added: usize,
}

/// Data payload from the retry-ingestion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryMessage {
    pub message: String,
}

/// Response from the file errors endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileErrorsResponse {
    pub errors: Vec<FileError>,
}
