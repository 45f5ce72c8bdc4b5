//! HTTP API client for the Rowbox server
//!
//! Provides methods to interact with the Rowbox backend API.

use crate::api::{endpoints, types::*, IngestApi};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use rowbox_common::types::{ColumnMapping, FileError, FileFormat, Schema, UploadedFile};
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// API Client Constants
// ============================================================================

/// Default timeout for API requests in seconds.
/// Can be overridden via ROWBOX_API_TIMEOUT_SECS environment variable.
/// Set to 5 minutes to accommodate large file uploads.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

/// Default Rowbox server URL when not specified via environment variable.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// API client for the Rowbox server
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: String) -> Result<Self> {
        let timeout_secs = std::env::var("ROWBOX_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("ROWBOX_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());

        Self::new(base_url)
    }

    /// Check server health
    pub async fn health_check(&self) -> Result<bool> {
        let url = endpoints::health_url(&self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Unwrap the standard response envelope, mapping application-level
    /// failures to an API error with a usable message.
    fn into_data<T>(response: ApiResponse<T>, fallback: &str) -> Result<T> {
        if response.success {
            Ok(response.data)
        } else {
            Err(PipelineError::api(
                response.error.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

fn mime_for(format: FileFormat) -> &'static str {
    match format {
        FileFormat::Csv => "text/csv",
        FileFormat::Xlsx => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        }
        FileFormat::Unknown => "application/octet-stream",
    }
}

#[async_trait]
impl IngestApi for ApiClient {
    async fn upload(&self, upload: &FileUpload) -> Result<UploadResponse> {
        let url = endpoints::upload_url(&self.base_url);

        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.filename.clone())
            .mime_str(mime_for(upload.format))?;

        let mut form = Form::new()
            .part("file", part)
            .text("fingerprint", upload.fingerprint.clone())
            .text("format", upload.format.to_string());
        if let Some(project_id) = upload.project_id {
            form = form.text("project_id", project_id.to_string());
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let api_response: ApiResponse<UploadResponse> = response.json().await?;
        Self::into_data(
            api_response,
            "Upload failed. Check that the server accepts this file type and size.",
        )
    }

    async fn file_status(&self, file_id: Uuid) -> Result<UploadedFile> {
        let url = endpoints::file_status_url(&self.base_url, file_id);

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let api_response: ApiResponse<FileStatusResponse> = response.json().await?;
        Self::into_data(api_response, "File status unavailable.").map(|data| data.file)
    }

    async fn list_files(&self, project_id: Option<Uuid>) -> Result<Vec<UploadedFile>> {
        let url = endpoints::files_url(&self.base_url, project_id);

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let api_response: ApiResponse<FilesResponse> = response.json().await?;
        Self::into_data(api_response, "Failed to list files.").map(|data| data.files)
    }

    async fn schemas(&self, project_id: Option<Uuid>) -> Result<Vec<Schema>> {
        let url = endpoints::schemas_url(&self.base_url, project_id);

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let api_response: ApiResponse<SchemasResponse> = response.json().await?;
        Self::into_data(api_response, "Failed to list schemas.").map(|data| data.schemas)
    }

    async fn create_schema(&self, request: &CreateSchemaRequest) -> Result<Schema> {
        let url = endpoints::schema_create_url(&self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let api_response: ApiResponse<Schema> = response.json().await?;
        Self::into_data(api_response, "Schema creation failed.")
    }

    async fn update_schema(
        &self,
        schema_id: Uuid,
        request: &UpdateSchemaRequest,
    ) -> Result<Schema> {
        let url = endpoints::schema_update_url(&self.base_url, schema_id);

        let response = self
            .client
            .put(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let api_response: ApiResponse<Schema> = response.json().await?;
        Self::into_data(api_response, "Schema update failed.")
    }

    async fn save_column_mapping(&self, mapping: &ColumnMapping) -> Result<usize> {
        let url = endpoints::column_mappings_url(&self.base_url);

        let response = self
            .client
            .post(&url)
            .json(mapping)
            .send()
            .await?
            .error_for_status()?;

        let api_response: ApiResponse<MappingSaved> = response.json().await?;
        Self::into_data(api_response, "Failed to save column mapping.")
            .map(|data| data.new_columns_added)
    }

    async fn activate_file(&self, file_id: Uuid) -> Result<()> {
        let url = endpoints::activate_url(&self.base_url, file_id);

        self.client
            .post(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| PipelineError::activation(e.to_string()))?;

        Ok(())
    }

    async fn retry_ingestion(&self, file_id: Uuid) -> Result<String> {
        let url = endpoints::retry_url(&self.base_url, file_id);

        let response = self.client.post(&url).send().await?.error_for_status()?;

        let api_response: ApiResponse<RetryMessage> = response.json().await?;
        Self::into_data(api_response, "Retry request failed.").map(|data| data.message)
    }

    async fn file_errors(&self, file_id: Uuid) -> Result<Vec<FileError>> {
        let url = endpoints::file_errors_url(&self.base_url, file_id);

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let api_response: ApiResponse<FileErrorsResponse> = response.json().await?;
        Self::into_data(api_response, "Failed to fetch file errors.").map(|data| data.errors)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_creation() {
        let client = ApiClient::new("http://localhost:8000".to_string()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_into_data_surfaces_server_error() {
        let response: ApiResponse<()> = ApiResponse {
            success: false,
            data: (),
            error: Some("schema not found".to_string()),
        };
        let err = ApiClient::into_data(response, "fallback").unwrap_err();
        assert!(err.to_string().contains("schema not found"));
    }

    #[test]
    fn test_into_data_uses_fallback_message() {
        let response: ApiResponse<()> = ApiResponse {
            success: false,
            data: (),
            error: None,
        };
        let err = ApiClient::into_data(response, "fallback message").unwrap_err();
        assert!(err.to_string().contains("fallback message"));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let client = ApiClient::new("http://localhost:9999".to_string()).unwrap();
        let result = client.health_check().await.unwrap();
        assert!(!result);
    }
}
