//! `rowbox status` command implementation
//!
//! Shows the ingestion status of a single file, optionally watching until it
//! reaches a terminal state.

use crate::error::Result;
use crate::progress::{format_bytes, format_progress};
use colored::Colorize;
use rowbox_pipeline::api::{ApiClient, IngestApi};
use rowbox_pipeline::poller::{self, ACTIVATION_WATCH};
use rowbox_pipeline::{EventBus, EventTag};
use rowbox_common::types::{FileStatus, IngestionProgress, UploadedFile};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Show the status of a file
pub async fn run(server_url: String, file_id: Uuid, watch: bool) -> Result<()> {
    let api = Arc::new(ApiClient::new(server_url)?);

    let file = api.file_status(file_id).await?;
    print_file(&file);

    if !watch || file.status.is_terminal() {
        return Ok(());
    }

    // Reuse the pipeline's activation watch; its bus events become console
    // lines here.
    let bus = EventBus::new();
    let _progress_sub = bus.subscribe(EventTag::ProcessingProgress, |event| {
        let snapshot = event
            .data
            .clone()
            .and_then(|d| serde_json::from_value::<IngestionProgress>(d).ok());
        if let Some(snapshot) = snapshot {
            println!("  {}", format_progress(&snapshot));
        }
    });

    println!();
    println!("Watching ingestion (Ctrl-C to stop)...");
    let active = poller::watch_activation(
        api.clone(),
        bus,
        file_id,
        ACTIVATION_WATCH,
        CancellationToken::new(),
    )
    .await;

    if active {
        println!("{}", "File is active and queryable.".green());
    } else {
        let file = api.file_status(file_id).await?;
        println!("Stopped watching; current status: {}", colorize_status(file.status));
    }

    Ok(())
}

fn print_file(file: &UploadedFile) {
    println!("{}", file.filename.green().bold());
    println!("  Id:       {}", file.id);
    println!("  Format:   {}", file.format);
    println!("  Size:     {}", format_bytes(file.size_bytes.max(0) as u64));
    println!("  Status:   {}", colorize_status(file.status));
    println!("  Uploaded: {}", file.uploaded_at);
    if let Some(ingested) = file.ingested_at {
        println!("  Ingested: {}", ingested);
    }
    if let Some(columns) = file.columns() {
        println!("  Columns:  {}", columns.join(", "));
    }
    if let Some(progress) = file.progress() {
        println!("  Progress: {}", format_progress(progress));
    }
}

/// Color a status by how much attention it needs.
pub fn colorize_status(status: FileStatus) -> String {
    match status {
        FileStatus::Active => status.to_string().green().to_string(),
        FileStatus::Error | FileStatus::TooLarge | FileStatus::Timeout => {
            status.to_string().red().to_string()
        }
        _ => status.to_string().yellow().to_string(),
    }
}
