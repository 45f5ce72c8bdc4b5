//! HTTP collaborator interface
//!
//! The relational store, spreadsheet processing, and activation machinery
//! all live behind the Rowbox server; this module is the pipeline's only
//! path to them. [`IngestApi`] abstracts the endpoint set so the coordinator
//! can run against the real [`ApiClient`] or a scripted test double.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::ApiClient;
pub use types::{
    ApiResponse, CreateSchemaRequest, FileUpload, UpdateSchemaRequest, UploadResponse,
};

use crate::error::Result;
use async_trait::async_trait;
use rowbox_common::types::{ColumnMapping, FileError, Schema, UploadedFile};
use uuid::Uuid;

/// The collaborator endpoints the ingestion pipeline depends on.
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Transmit a file. The server may answer "duplicate", pointing at an
    /// existing file id instead of creating a new record.
    async fn upload(&self, upload: &FileUpload) -> Result<UploadResponse>;

    /// Fetch the current status and metadata of a file.
    async fn file_status(&self, file_id: Uuid) -> Result<UploadedFile>;

    /// List files in a project.
    async fn list_files(&self, project_id: Option<Uuid>) -> Result<Vec<UploadedFile>>;

    /// List schemas in a project.
    async fn schemas(&self, project_id: Option<Uuid>) -> Result<Vec<Schema>>;

    /// Create a schema with an initial column set.
    async fn create_schema(&self, request: &CreateSchemaRequest) -> Result<Schema>;

    /// Replace a schema's column set.
    async fn update_schema(&self, schema_id: Uuid, request: &UpdateSchemaRequest)
        -> Result<Schema>;

    /// Persist a column mapping record. Returns the server-confirmed count
    /// of newly added schema columns.
    async fn save_column_mapping(&self, mapping: &ColumnMapping) -> Result<usize>;

    /// Request activation of a mapped file.
    async fn activate_file(&self, file_id: Uuid) -> Result<()>;

    /// Re-attempt ingestion, e.g. with larger-file-friendly batch settings.
    async fn retry_ingestion(&self, file_id: Uuid) -> Result<String>;

    /// Fetch the append-only error log for a file.
    async fn file_errors(&self, file_id: Uuid) -> Result<Vec<FileError>>;
}
