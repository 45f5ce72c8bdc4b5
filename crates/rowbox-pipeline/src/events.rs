//! Lifecycle events published on the event bus
//!
//! Events are ephemeral: they exist only on the bus and are never persisted.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Tag identifying the kind of a lifecycle event.
///
/// [`EventTag::Wildcard`] is a subscription-only tag: handlers registered
/// under it receive every published event regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    UploadStarted,
    UploadProgress,
    UploadCompleted,
    ProcessingStarted,
    ProcessingProgress,
    ProcessingCompleted,
    SchemaCreated,
    SchemaUpdated,
    MappingCompleted,
    ActivationStarted,
    ActivationCompleted,
    DeleteStarted,
    DeleteCompleted,
    FileError,
    Wildcard,
}

impl EventTag {
    pub fn as_str(self) -> &'static str {
        match self {
            EventTag::UploadStarted => "upload:started",
            EventTag::UploadProgress => "upload:progress",
            EventTag::UploadCompleted => "upload:completed",
            EventTag::ProcessingStarted => "processing:started",
            EventTag::ProcessingProgress => "processing:progress",
            EventTag::ProcessingCompleted => "processing:completed",
            EventTag::SchemaCreated => "schema:created",
            EventTag::SchemaUpdated => "schema:updated",
            EventTag::MappingCompleted => "mapping:completed",
            EventTag::ActivationStarted => "activation:started",
            EventTag::ActivationCompleted => "activation:completed",
            EventTag::DeleteStarted => "delete:started",
            EventTag::DeleteCompleted => "delete:completed",
            EventTag::FileError => "file:error",
            EventTag::Wildcard => "*",
        }
    }
}

impl std::fmt::Display for EventTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single lifecycle event.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub tag: EventTag,
    pub file_id: Option<Uuid>,
    pub file_name: Option<String>,
    pub project_id: Option<Uuid>,
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

impl LifecycleEvent {
    /// Create an event with the given tag, stamped now.
    pub fn new(tag: EventTag) -> Self {
        Self {
            tag,
            file_id: None,
            file_name: None,
            project_id: None,
            data: None,
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn with_file(mut self, file_id: Uuid) -> Self {
        self.file_id = Some(file_id);
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_project(mut self, project_id: Option<Uuid>) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
