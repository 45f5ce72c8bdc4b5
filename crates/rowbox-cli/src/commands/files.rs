//! `rowbox files` command implementation
//!
//! Lists uploaded files in a project.

use crate::commands::status::colorize_status;
use crate::error::Result;
use crate::progress::format_bytes;
use comfy_table::{presets::UTF8_FULL, Table};
use rowbox_pipeline::api::{ApiClient, IngestApi};
use uuid::Uuid;

/// List uploaded files
pub async fn run(server_url: String, project_id: Option<Uuid>) -> Result<()> {
    let api = ApiClient::new(server_url)?;

    let files = api.list_files(project_id).await?;

    if files.is_empty() {
        println!("No files uploaded yet.");
        println!("Run 'rowbox upload <path>' to ingest a file.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Id", "File", "Size", "Status", "Uploaded"]);

    for file in &files {
        table.add_row(vec![
            file.id.to_string(),
            file.filename.clone(),
            format_bytes(file.size_bytes.max(0) as u64),
            colorize_status(file.status),
            file.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
    println!("{} file(s)", files.len());

    Ok(())
}
