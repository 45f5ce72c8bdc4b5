//! `rowbox upload` command implementation
//!
//! Runs one file through the full ingestion pipeline: upload, header
//! extraction, schema reconciliation, column mapping, and activation.

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::parser::CsvParser;
use crate::progress::{create_spinner, format_progress};
use crate::prompt::{AcceptSuggestionsPrompt, InteractivePrompt};
use colored::Colorize;
use rowbox_common::types::IngestionProgress;
use rowbox_pipeline::api::ApiClient;
use rowbox_pipeline::coordinator::{MappingPrompt, MappingResolution, UploadLimits};
use rowbox_pipeline::{EventBus, EventTag, UploadCoordinator, UploadRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Upload a file and run the ingestion pipeline
pub async fn run(
    server_url: String,
    project_id: Option<Uuid>,
    path: PathBuf,
    yes: bool,
    no_wait: bool,
) -> Result<()> {
    if !path.is_file() {
        return Err(CliError::file_not_found(path.display().to_string()));
    }

    let config = Config::from_env()?;
    let project_id = project_id.or(config.project_id);

    let api = Arc::new(ApiClient::new(server_url)?);
    let bus = EventBus::new();
    let prompt: Arc<dyn MappingPrompt> = if yes {
        Arc::new(AcceptSuggestionsPrompt)
    } else {
        Arc::new(InteractivePrompt)
    };

    let limits = UploadLimits {
        max_size_bytes: config.max_upload_bytes,
        ..UploadLimits::default()
    };

    let coordinator = UploadCoordinator::new(api, Arc::new(CsvParser), prompt, bus)
        .with_project(project_id)
        .with_limits(limits);

    // Surface schema changes and server errors as they happen.
    let _schema_sub = coordinator.bus().subscribe(EventTag::SchemaCreated, |_| {
        println!("{}", "Created a new schema from this file's columns.".cyan());
    });
    let _update_sub = coordinator.bus().subscribe(EventTag::SchemaUpdated, |event| {
        let added = event
            .data
            .as_ref()
            .and_then(|d| d.get("columns_added"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        println!("{}", format!("Schema extended with {} new column(s).", added).cyan());
    });
    let _error_sub = coordinator.bus().subscribe(EventTag::FileError, |event| {
        if let Some(error) = &event.error {
            eprintln!("{} {}", "error:".red().bold(), error);
        }
    });

    println!("Uploading {}...", path.display());
    let request = UploadRequest::from_path(&path)?;
    let outcome = coordinator.upload(request).await?;

    info!(file_id = %outcome.file_id, duplicate = outcome.duplicate, "Upload pipeline finished");

    if outcome.duplicate {
        println!(
            "{} matches a previously uploaded file ({}).",
            "Duplicate:".yellow().bold(),
            outcome.file_id
        );
    } else {
        println!("File id: {}", outcome.file_id.to_string().green());
    }

    match &outcome.resolution {
        MappingResolution::SchemaCreated { schema } => {
            println!(
                "Schema '{}' created with {} column(s).",
                schema.name,
                schema.columns.len()
            );
        }
        MappingResolution::AutoMapped { .. } => {
            println!("All columns matched the active schema; mapped automatically.");
        }
        MappingResolution::ManuallyMapped {
            new_columns_added,
            warnings,
            ..
        } => {
            println!("Mapping committed ({} column(s) added to the schema).", new_columns_added);
            for warning in warnings {
                println!("{} {}", "warning:".yellow().bold(), warning);
            }
        }
        MappingResolution::MappingPending => {
            println!(
                "{}",
                "A mapping for this file is already pending; nothing further to do.".yellow()
            );
            return Ok(());
        }
        MappingResolution::AlreadyActive => {
            println!("{}", "File is already active and queryable.".green());
            return Ok(());
        }
    }

    let Some(watch) = outcome.activation_watch else {
        return Ok(());
    };

    if no_wait {
        println!("Activation continues on the server; check it with 'rowbox status {}'.", outcome.file_id);
        watch.abort();
        return Ok(());
    }

    let spinner = create_spinner("Waiting for activation...");
    let progress_spinner = spinner.clone();
    let _progress_sub = coordinator
        .bus()
        .subscribe(EventTag::ProcessingProgress, move |event| {
            let snapshot = event
                .data
                .clone()
                .and_then(|d| serde_json::from_value::<IngestionProgress>(d).ok());
            if let Some(snapshot) = snapshot {
                progress_spinner.set_message(format!("Ingesting: {}", format_progress(&snapshot)));
            }
        });

    let active = watch.await.unwrap_or(false);
    if active {
        spinner.finish_with_message("File is active and queryable.".green().to_string());
    } else {
        spinner.finish_with_message(
            format!(
                "Still processing. Check progress later with 'rowbox status {}'.",
                outcome.file_id
            )
            .yellow()
            .to_string(),
        );
    }

    Ok(())
}
