//! `rowbox schema` command implementation
//!
//! Shows the active schema or lists all schemas in the project.

use crate::error::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use rowbox_pipeline::api::{ApiClient, IngestApi};
use uuid::Uuid;

/// Show the active schema's columns
pub async fn show(server_url: String, project_id: Option<Uuid>) -> Result<()> {
    let api = ApiClient::new(server_url)?;

    let schemas = api.schemas(project_id).await?;
    let Some(active) = schemas.into_iter().find(|s| s.is_active) else {
        println!("No active schema.");
        println!("The first upload into this project will create one from its columns.");
        return Ok(());
    };

    println!(
        "{} ({} column(s))",
        active.name.green().bold(),
        active.columns.len()
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Column", "Type", "Required"]);

    for column in &active.columns {
        table.add_row(vec![
            column.name.clone(),
            column.column_type.to_string(),
            if column.is_required { "yes".to_string() } else { "no".to_string() },
        ]);
    }

    println!("{table}");

    Ok(())
}

/// List all schemas in the project
pub async fn list(server_url: String, project_id: Option<Uuid>) -> Result<()> {
    let api = ApiClient::new(server_url)?;

    let schemas = api.schemas(project_id).await?;
    if schemas.is_empty() {
        println!("No schemas in this project.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Id", "Name", "Columns", "Active"]);

    for schema in &schemas {
        table.add_row(vec![
            schema.id.to_string(),
            schema.name.clone(),
            schema.columns.len().to_string(),
            if schema.is_active {
                "yes".green().to_string()
            } else {
                "no".to_string()
            },
        ]);
    }

    println!("{table}");

    Ok(())
}
