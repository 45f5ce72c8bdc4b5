//! Throttled file-list refresh
//!
//! Widgets ask for a refetch of the project's file list after most pipeline
//! events, so requests arrive in bursts. This coalescer guarantees that no
//! two list fetches execute less than a minimum interval apart, with at most
//! one fetch queued to run immediately after the current one completes;
//! further requests during that window are dropped.

use crate::api::IngestApi;
use rowbox_common::types::UploadedFile;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default minimum spacing between two list fetches.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Handle to the background refresh task.
pub struct ListRefresher {
    tx: mpsc::Sender<()>,
    cancel: CancellationToken,
}

impl ListRefresher {
    /// Spawn the refresh task. `on_update` receives each fetched file list.
    pub fn spawn(
        api: Arc<dyn IngestApi>,
        project_id: Option<Uuid>,
        min_interval: Duration,
        on_update: impl Fn(Vec<UploadedFile>) + Send + Sync + 'static,
    ) -> Self {
        // Capacity 1: while a fetch is running, exactly one follow-up can be
        // queued; extra requests coalesce into it.
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        tokio::spawn(run_loop(
            api,
            project_id,
            min_interval,
            rx,
            cancel.clone(),
            on_update,
        ));

        Self { tx, cancel }
    }

    /// Request a refresh. Never blocks; concurrent requests coalesce.
    pub fn request(&self) {
        let _ = self.tx.try_send(());
    }

    /// Stop the background task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ListRefresher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_loop(
    api: Arc<dyn IngestApi>,
    project_id: Option<Uuid>,
    min_interval: Duration,
    mut rx: mpsc::Receiver<()>,
    cancel: CancellationToken,
    on_update: impl Fn(Vec<UploadedFile>) + Send + Sync + 'static,
) {
    let mut last_fetch: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            request = rx.recv() => {
                if request.is_none() {
                    break;
                }
            }
        }

        // Enforce the minimum spacing since the previous fetch.
        if let Some(last) = last_fetch {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(min_interval - elapsed) => {}
                }
            }
        }

        match api.list_files(project_id).await {
            Ok(files) => {
                debug!(count = files.len(), "File list refreshed");
                on_update(files);
            }
            Err(error) => {
                // Best-effort: a failed refresh just leaves the stale list.
                warn!(error = %error, "File list refresh failed");
            }
        }
        last_fetch = Some(Instant::now());
    }
}
