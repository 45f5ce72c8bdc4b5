//! Ingestion status polling
//!
//! Two distinct polling duties, run independently and bounded by retry
//! budgets:
//!
//! - **Extraction wait**: right after upload, watch for the server to finish
//!   header extraction. Exhausting the budget is not an error; the pipeline
//!   proceeds with whatever columns it has.
//! - **Activation watch**: after a mapping is committed and activation
//!   requested, observe progress purely to feed the event bus. Self-cancels
//!   the moment `active` is seen and silently stops at the time budget; the
//!   file may still become active later.
//!
//! Both duties accept a [`CancellationToken`] so they compose with the
//! coordinator's own cancellation and never leak polling loops. Cancellation
//! stops scheduling further attempts and emits no completion events.

use crate::api::IngestApi;
use crate::bus::EventBus;
use crate::events::{EventTag, LifecycleEvent};
use rowbox_common::types::{FileStatus, UploadedFile};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Retry/time budget for one polling duty.
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Extraction wait: 1 second interval, 10 attempts.
pub const EXTRACTION_WAIT: PollBudget = PollBudget {
    interval: Duration::from_secs(1),
    max_attempts: 10,
};

/// Activation watch: 5 second interval, 24 attempts (about two minutes).
pub const ACTIVATION_WATCH: PollBudget = PollBudget {
    interval: Duration::from_secs(5),
    max_attempts: 24,
};

/// Sleep one interval, returning `false` if cancelled first.
async fn pause(interval: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}

/// Poll until the server reports headers extracted (or the file already
/// active), within the budget.
///
/// Returns the last observed file state, if any. Network failures stop the
/// polling and degrade silently; callers fall back to local extraction.
/// A terminal server status also stops the wait early so the coordinator can
/// inspect it.
pub async fn wait_for_extraction(
    api: &dyn IngestApi,
    file_id: Uuid,
    budget: &PollBudget,
    cancel: &CancellationToken,
) -> Option<UploadedFile> {
    let mut last = None;

    for attempt in 0..budget.max_attempts {
        if cancel.is_cancelled() {
            return last;
        }
        if attempt > 0 && !pause(budget.interval, cancel).await {
            return last;
        }

        match api.file_status(file_id).await {
            Ok(file) => {
                let status = file.status;
                if matches!(status, FileStatus::Active | FileStatus::HeadersExtracted) {
                    return Some(file);
                }
                let stop = status.is_terminal();
                last = Some(file);
                if stop {
                    debug!(file_id = %file_id, %status, "Terminal status during extraction wait");
                    return last;
                }
            }
            Err(error) => {
                // Best-effort step: a transient network hiccup must not block
                // the upload from completing.
                warn!(file_id = %file_id, error = %error, "Status poll failed; stopping extraction wait");
                return last;
            }
        }
    }

    debug!(file_id = %file_id, "Extraction wait budget exhausted");
    last
}

/// Watch a file until it becomes active, publishing progress to observers.
///
/// Returns `true` if `active` was observed within the budget. Failure to
/// observe it is not an error and publishes nothing; the watch just stops.
pub async fn watch_activation(
    api: Arc<dyn IngestApi>,
    bus: EventBus,
    file_id: Uuid,
    budget: PollBudget,
    cancel: CancellationToken,
) -> bool {
    for attempt in 0..budget.max_attempts {
        if cancel.is_cancelled() {
            return false;
        }
        if attempt > 0 && !pause(budget.interval, &cancel).await {
            return false;
        }

        match api.file_status(file_id).await {
            Ok(file) => {
                if let Some(progress) = file.progress() {
                    if let Ok(data) = serde_json::to_value(progress) {
                        bus.publish(
                            &LifecycleEvent::new(EventTag::ProcessingProgress)
                                .with_file(file_id)
                                .with_data(data),
                        );
                    }
                }

                if file.status == FileStatus::Active {
                    bus.publish(
                        &LifecycleEvent::new(EventTag::ProcessingCompleted).with_file(file_id),
                    );
                    bus.publish(
                        &LifecycleEvent::new(EventTag::ActivationCompleted).with_file(file_id),
                    );
                    return true;
                }
            }
            Err(error) => {
                warn!(file_id = %file_id, error = %error, "Status poll failed; stopping activation watch");
                return false;
            }
        }
    }

    debug!(file_id = %file_id, "Activation watch budget exhausted without observing active");
    false
}
