//! Rowbox Ingestion Pipeline
//!
//! The file ingestion and schema reconciliation pipeline: everything that
//! takes a raw uploaded tabular file (CSV/XLSX) from "bytes received" to
//! "queryable row set" against a project's shared, evolving schema.
//!
//! # Overview
//!
//! - **Fingerprinting**: cheap identity fingerprints for duplicate
//!   suppression ([`fingerprint`])
//! - **Header Extraction**: column names from a bounded preview, with a
//!   degraded raw-bytes fallback ([`headers`])
//! - **Schema Reconciliation**: auto-create / auto-map / manual-mapping
//!   decisions ([`reconcile`])
//! - **Column Mapping**: deterministic suggestions and append-only commits
//!   ([`mapping`])
//! - **Status Polling**: bounded, cancellable extraction and activation
//!   watches ([`poller`])
//! - **Event Bus**: injected in-process pub/sub for lifecycle events
//!   ([`bus`], [`events`])
//! - **Upload Coordination**: the top-level state machine sequencing all of
//!   the above ([`coordinator`])
//!
//! The relational store itself is an external collaborator reached through
//! the HTTP client in [`api`]; parsing of file bytes is delegated to a
//! [`headers::Parser`] implementation supplied by the caller.

pub mod api;
pub mod bus;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod headers;
pub mod mapping;
pub mod poller;
pub mod reconcile;
pub mod refresh;

// Re-export commonly used types
pub use bus::EventBus;
pub use coordinator::{
    MappingPrompt, MappingPromptRequest, MappingResolution, UploadCoordinator, UploadLimits,
    UploadOutcome, UploadRequest,
};
pub use error::{PipelineError, Result, Stage};
pub use events::{EventTag, LifecycleEvent};
