//! `rowbox errors` command implementation
//!
//! Shows the append-only server-side error log for a file.

use crate::error::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use rowbox_pipeline::api::{ApiClient, IngestApi};
use uuid::Uuid;

/// Show the error log for a file
pub async fn run(server_url: String, file_id: Uuid) -> Result<()> {
    let api = ApiClient::new(server_url)?;

    let errors = api.file_errors(file_id).await?;

    if errors.is_empty() {
        println!("No errors recorded for this file.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["When", "Severity", "Type", "Message"]);

    for error in &errors {
        let severity = match error.severity.as_str() {
            "error" | "fatal" => error.severity.red().to_string(),
            "warning" => error.severity.yellow().to_string(),
            _ => error.severity.clone(),
        };
        table.add_row(vec![
            error.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            severity,
            error.error_type.clone(),
            error.message.clone(),
        ]);
    }

    println!("{table}");
    println!("{} error(s)", errors.len());

    Ok(())
}
