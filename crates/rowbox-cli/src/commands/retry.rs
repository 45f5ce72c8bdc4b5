//! `rowbox retry` command implementation
//!
//! Re-attempts ingestion of a file the server declared too large. The server
//! re-runs the ingestion with large-file batch settings.

use crate::error::Result;
use colored::Colorize;
use rowbox_pipeline::api::{ApiClient, IngestApi};
use std::sync::Arc;
use uuid::Uuid;

/// Re-attempt ingestion for a file
pub async fn run(server_url: String, file_id: Uuid) -> Result<()> {
    let api = Arc::new(ApiClient::new(server_url)?);

    let message = api.retry_ingestion(file_id).await?;

    println!("{} {}", "Retry requested:".green().bold(), message);
    println!("Watch progress with 'rowbox status {} --watch'.", file_id);

    Ok(())
}
