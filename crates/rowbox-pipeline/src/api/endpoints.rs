//! API endpoint URL builders
//!
//! Helper functions to construct API endpoint URLs.

use uuid::Uuid;

/// Build file upload endpoint URL
pub fn upload_url(base_url: &str) -> String {
    format!("{}/api/v1/files/upload", base_url)
}

/// Build file status URL
pub fn file_status_url(base_url: &str, file_id: Uuid) -> String {
    format!("{}/api/v1/files/{}/status", base_url, file_id)
}

/// Build file listing URL
pub fn files_url(base_url: &str, project_id: Option<Uuid>) -> String {
    match project_id {
        Some(id) => format!("{}/api/v1/files?project_id={}", base_url, id),
        None => format!("{}/api/v1/files", base_url),
    }
}

/// Build schema listing URL
pub fn schemas_url(base_url: &str, project_id: Option<Uuid>) -> String {
    match project_id {
        Some(id) => format!("{}/api/v1/schemas?project_id={}", base_url, id),
        None => format!("{}/api/v1/schemas", base_url),
    }
}

/// Build schema create URL
pub fn schema_create_url(base_url: &str) -> String {
    format!("{}/api/v1/schemas", base_url)
}

/// Build schema update URL
pub fn schema_update_url(base_url: &str, schema_id: Uuid) -> String {
    format!("{}/api/v1/schemas/{}", base_url, schema_id)
}

/// Build column mappings URL
pub fn column_mappings_url(base_url: &str) -> String {
    format!("{}/api/v1/column-mappings", base_url)
}

/// Build file activation URL
pub fn activate_url(base_url: &str, file_id: Uuid) -> String {
    format!("{}/api/v1/files/{}/activate", base_url, file_id)
}

/// Build ingestion retry URL
pub fn retry_url(base_url: &str, file_id: Uuid) -> String {
    format!("{}/api/v1/files/{}/retry", base_url, file_id)
}

/// Build file errors URL
pub fn file_errors_url(base_url: &str, file_id: Uuid) -> String {
    format!("{}/api/v1/files/{}/errors", base_url, file_id)
}

/// Build health check URL
pub fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url)
}
