//! Progress indicators for CLI operations
//!
//! Spinners and bars for uploads and ingestion watches.

use indicatif::{ProgressBar, ProgressStyle};
use rowbox_common::types::IngestionProgress;

/// Create a spinner for indeterminate operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Create a row-count progress bar for an ingestion watch
pub fn create_ingestion_progress(total_rows: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total_rows);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} rows ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Render a one-line summary of an ingestion progress snapshot
pub fn format_progress(progress: &IngestionProgress) -> String {
    let mut parts = vec![format!("{} rows", progress.processed)];
    if let Some(total) = progress.total {
        parts.push(format!("of {}", total));
    }
    if let Some(pct) = progress.percentage {
        parts.push(format!("({}%)", pct));
    }
    if progress.rows_per_second > 0.0 {
        parts.push(format!("at {:.0} rows/s", progress.rows_per_second));
    }
    parts.join(" ")
}

/// Format bytes into a human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
