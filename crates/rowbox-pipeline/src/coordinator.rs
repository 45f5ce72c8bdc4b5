//! Upload coordination
//!
//! The top-level state machine that takes one file from "bytes received" to
//! "queryable row set":
//!
//! ```text
//! validating -> transmitting -> extracting_headers -> reconciling_schema
//!     -> (mapping_required | auto_mapped) -> activating -> polling_activation
//! ```
//!
//! Failure semantics follow the load-bearing/best-effort split: validation,
//! transmission, persistence, and activation failures are fatal and reported
//! as `file:error` events with a stage tag; schema fetches, header
//! extraction, and status polls degrade to safe defaults so a transient
//! network hiccup never blocks an upload from completing.
//!
//! Each upload runs as one cooperative task; concurrent uploads are
//! independent coordinator calls with no cross-file ordering. The schema is
//! read-then-written without optimistic concurrency: the auto-create path
//! re-reads the schema list immediately before creating to narrow the
//! two-uploads-race-to-create-the-first-schema window, but a server-side
//! transactional guard is the real fix.

use crate::api::{CreateSchemaRequest, FileUpload, IngestApi, UpdateSchemaRequest};
use crate::bus::EventBus;
use crate::error::{PipelineError, Result, Stage};
use crate::events::{EventTag, LifecycleEvent};
use crate::fingerprint;
use crate::headers::{self, Parser};
use crate::mapping::{self, MappingDecision, Suggestion};
use crate::poller::{self, PollBudget, ACTIVATION_WATCH, EXTRACTION_WAIT};
use crate::reconcile::{self, Reconciliation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rowbox_common::types::{ColumnMapping, FileFormat, FileStatus, Schema, UploadedFile};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// Upload Limits
// ============================================================================

/// Default size ceiling for a single upload (100 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Name given to auto-created schemas.
pub const AUTO_SCHEMA_NAME: &str = "default";

/// Pre-transmission validation limits.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_size_bytes: u64,
    /// Allowed formats by extension.
    pub allowed_formats: Vec<FileFormat>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            allowed_formats: vec![FileFormat::Csv, FileFormat::Xlsx],
        }
    }
}

impl UploadLimits {
    /// Validate size and type before any network call.
    ///
    /// The filename extension is authoritative for the format; a declared
    /// MIME type is only consulted when the extension is unrecognized, since
    /// upload clients routinely misreport the XLSX MIME type.
    pub fn validate(
        &self,
        filename: &str,
        size_bytes: u64,
        content_type: Option<&str>,
    ) -> Result<FileFormat> {
        if size_bytes == 0 {
            return Err(PipelineError::validation(format!(
                "'{}' is empty",
                filename
            )));
        }
        if size_bytes > self.max_size_bytes {
            return Err(PipelineError::validation(format!(
                "'{}' is {} bytes; the limit is {} bytes",
                filename, size_bytes, self.max_size_bytes
            )));
        }

        let mut format = FileFormat::from_filename(filename);
        if format == FileFormat::Unknown {
            format = match content_type {
                Some("text/csv") => FileFormat::Csv,
                Some(
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ) => FileFormat::Xlsx,
                _ => FileFormat::Unknown,
            };
        }

        if format == FileFormat::Unknown || !self.allowed_formats.contains(&format) {
            return Err(PipelineError::validation(format!(
                "'{}' is not a supported file type; expected one of: {}",
                filename,
                self.allowed_formats
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        Ok(format)
    }
}

// ============================================================================
// Requests and Outcomes
// ============================================================================

/// One file to be ingested.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub modified_at: DateTime<Utc>,
    /// Declared MIME type, if the caller has one. Advisory only.
    pub content_type: Option<String>,
}

impl UploadRequest {
    /// Build a request from a file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let modified_at: DateTime<Utc> = metadata.modified()?.into();
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            filename,
            bytes,
            modified_at,
            content_type: None,
        })
    }
}

/// How the file's columns were resolved against the schema.
#[derive(Debug)]
pub enum MappingResolution {
    /// No active schema existed; one was auto-created and the file mapped
    /// identity onto it.
    SchemaCreated { schema: Schema },
    /// All file columns already existed; mapped identity without user
    /// interaction.
    AutoMapped { schema_id: Uuid },
    /// Manual mapping ran and was committed.
    ManuallyMapped {
        schema_id: Uuid,
        new_columns_added: usize,
        warnings: Vec<String>,
    },
    /// Manual mapping is already pending for this file from an earlier
    /// invocation; the prompt was not re-opened.
    MappingPending,
    /// Duplicate of a file that is already active and queryable.
    AlreadyActive,
}

/// Result of a completed (or suspended) upload pipeline run.
#[derive(Debug)]
pub struct UploadOutcome {
    pub file_id: Uuid,
    /// The server matched the fingerprint to an existing file.
    pub duplicate: bool,
    /// Columns the pipeline reconciled with (extracted or synthetic).
    pub columns: Vec<String>,
    pub resolution: MappingResolution,
    /// Handle to the background activation watch, when one was started.
    /// Resolves to `true` once `active` is observed within the budget.
    pub activation_watch: Option<JoinHandle<bool>>,
}

/// The manual-mapping round-trip: the single point where a human decision
/// re-enters the pipeline.
#[derive(Debug, Clone)]
pub struct MappingPromptRequest {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_columns: Vec<String>,
    /// Columns absent from the schema (exact set difference).
    pub new_columns: Vec<String>,
    pub schema: Schema,
    /// Non-binding pre-fill for the form.
    pub suggestions: Vec<Suggestion>,
}

/// Collaborator that resolves a manual mapping (a UI form, a CLI prompt, or
/// a scripted decision set in tests).
#[async_trait]
pub trait MappingPrompt: Send + Sync {
    async fn resolve(&self, request: MappingPromptRequest) -> Result<Vec<MappingDecision>>;
}

// ============================================================================
// Coordinator
// ============================================================================

/// Orchestrates the ingestion pipeline for one project.
///
/// Cheap to share behind an `Arc`; each [`UploadCoordinator::upload`] call
/// is an independent pipeline run.
pub struct UploadCoordinator {
    api: Arc<dyn IngestApi>,
    parser: Arc<dyn Parser>,
    prompt: Arc<dyn MappingPrompt>,
    bus: EventBus,
    limits: UploadLimits,
    project_id: Option<Uuid>,
    extraction_budget: PollBudget,
    activation_budget: PollBudget,
    /// Files whose manual-mapping prompt has been opened. Guarantees the
    /// prompt fires at most once per file id across invocations.
    processed_file_ids: Mutex<HashSet<Uuid>>,
    cancel: CancellationToken,
}

impl UploadCoordinator {
    pub fn new(
        api: Arc<dyn IngestApi>,
        parser: Arc<dyn Parser>,
        prompt: Arc<dyn MappingPrompt>,
        bus: EventBus,
    ) -> Self {
        Self {
            api,
            parser,
            prompt,
            bus,
            limits: UploadLimits::default(),
            project_id: None,
            extraction_budget: EXTRACTION_WAIT,
            activation_budget: ACTIVATION_WATCH,
            processed_file_ids: Mutex::new(HashSet::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_project(mut self, project_id: Option<Uuid>) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_budgets(mut self, extraction: PollBudget, activation: PollBudget) -> Self {
        self.extraction_budget = extraction;
        self.activation_budget = activation;
        self
    }

    /// The bus this coordinator publishes lifecycle events on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Stop all polling loops owned by this coordinator. In-flight network
    /// calls still complete, but no further attempts are scheduled and no
    /// spurious completion events are emitted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Run the full ingestion pipeline for one file.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome> {
        let filename = request.filename.clone();

        // 1. Validation: violations block before any network call.
        let format = self
            .limits
            .validate(&filename, request.bytes.len() as u64, request.content_type.as_deref())
            .map_err(|e| self.fail(Stage::Validation, None, &filename, e))?;

        self.publish(
            LifecycleEvent::new(EventTag::UploadStarted)
                .with_file_name(&filename)
                .with_project(self.project_id),
        );

        // 2. Transmission, with the fingerprint for duplicate suppression.
        let upload = FileUpload {
            filename: filename.clone(),
            bytes: request.bytes.clone(),
            format,
            fingerprint: fingerprint::fingerprint(
                &filename,
                request.bytes.len() as u64,
                request.modified_at,
            ),
            project_id: self.project_id,
        };

        let response = match self.api.upload(&upload).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(Stage::Transmission, None, &filename, e)),
        };
        let file_id = response.file_id;

        // 3. Header extraction. For a fresh upload, race the server's own
        // extraction (extraction-wait poll) against local parsing; for a
        // duplicate, reuse whatever the existing record already has.
        let server_file = if response.duplicate {
            info!(file_id = %file_id, file = %filename, "Duplicate detected; reusing existing file");
            self.publish(
                LifecycleEvent::new(EventTag::UploadProgress)
                    .with_file(file_id)
                    .with_file_name(&filename)
                    .with_data(json!({ "duplicate": true })),
            );
            self.api.file_status(file_id).await.ok()
        } else {
            self.publish(
                LifecycleEvent::new(EventTag::ProcessingStarted)
                    .with_file(file_id)
                    .with_file_name(&filename),
            );
            poller::wait_for_extraction(
                self.api.as_ref(),
                file_id,
                &self.extraction_budget,
                &self.cancel,
            )
            .await
        };

        if let Some(file) = &server_file {
            match file.status {
                FileStatus::TooLarge => {
                    self.surface_server_errors(file_id).await;
                    return Err(self.fail(
                        Stage::Polling,
                        Some(file_id),
                        &filename,
                        PipelineError::TooLarge(file_id),
                    ));
                }
                FileStatus::Error => {
                    self.surface_server_errors(file_id).await;
                    return Err(self.fail(
                        Stage::Polling,
                        Some(file_id),
                        &filename,
                        PipelineError::api("Server reported an ingestion error for this file"),
                    ));
                }
                FileStatus::Active if response.duplicate => {
                    // Already mapped and queryable; nothing left to reconcile.
                    self.publish(
                        LifecycleEvent::new(EventTag::UploadCompleted)
                            .with_file(file_id)
                            .with_file_name(&filename),
                    );
                    return Ok(UploadOutcome {
                        file_id,
                        duplicate: true,
                        columns: file.columns().map(<[String]>::to_vec).unwrap_or_default(),
                        resolution: MappingResolution::AlreadyActive,
                        activation_watch: None,
                    });
                }
                _ => {}
            }
        }

        let columns = self.resolve_columns(server_file.as_ref(), &request.bytes, format);

        // 4. Schema reconciliation. The schema fetch is best-effort: on
        // failure, proceed as if no schema exists.
        let mut active_schema = self.fetch_active_schema().await;
        let mut decision = reconcile::reconcile(&columns, active_schema.as_ref());

        if matches!(decision, Reconciliation::CreateSchema { .. }) {
            // Create-if-absent guard: a concurrent upload may have created
            // the first schema since the fetch above.
            if let Ok(schemas) = self.api.schemas(self.project_id).await {
                if let Some(schema) = schemas.into_iter().find(|s| s.is_active) {
                    debug!(schema_id = %schema.id, "Active schema appeared before auto-create; reconciling against it");
                    active_schema = Some(schema);
                    decision = reconcile::reconcile(&columns, active_schema.as_ref());
                }
            }
        }

        let resolution = match decision {
            Reconciliation::CreateSchema { columns: schema_columns } => {
                self.auto_create_schema(file_id, &filename, &columns, schema_columns)
                    .await?
            }
            Reconciliation::AutoMap { schema_id, mappings } => {
                self.auto_map(file_id, &filename, schema_id, mappings).await?
            }
            Reconciliation::ManualMappingRequired { schema_id, new_columns } => {
                let schema = active_schema.ok_or_else(|| {
                    PipelineError::api("Reconciliation requires a schema that no longer exists")
                })?;
                debug_assert_eq!(schema.id, schema_id);

                match self
                    .manual_map(file_id, &filename, &columns, new_columns, schema)
                    .await?
                {
                    Some(resolution) => resolution,
                    None => {
                        // Prompt already opened by an earlier invocation;
                        // leave the pipeline suspended.
                        return Ok(UploadOutcome {
                            file_id,
                            duplicate: response.duplicate,
                            columns,
                            resolution: MappingResolution::MappingPending,
                            activation_watch: None,
                        });
                    }
                }
            }
        };

        // 5. Activation, with a detached watch feeding observers.
        self.publish(
            LifecycleEvent::new(EventTag::ActivationStarted)
                .with_file(file_id)
                .with_file_name(&filename),
        );
        if let Err(e) = self.api.activate_file(file_id).await {
            self.surface_server_errors(file_id).await;
            return Err(self.fail(
                Stage::Activation,
                Some(file_id),
                &filename,
                PipelineError::activation(e.to_string()),
            ));
        }

        let watch = tokio::spawn(poller::watch_activation(
            Arc::clone(&self.api),
            self.bus.clone(),
            file_id,
            self.activation_budget,
            self.cancel.child_token(),
        ));

        // 6. Terminal event: the upload sequence itself is done; the watch
        // keeps observers updated without blocking the caller.
        self.publish(
            LifecycleEvent::new(EventTag::UploadCompleted)
                .with_file(file_id)
                .with_file_name(&filename)
                .with_project(self.project_id),
        );

        Ok(UploadOutcome {
            file_id,
            duplicate: response.duplicate,
            columns,
            resolution,
            activation_watch: Some(watch),
        })
    }

    /// Re-attempt ingestion for a file the server declared too large, and
    /// start a fresh activation watch for it.
    pub async fn retry_ingestion(&self, file_id: Uuid) -> Result<String> {
        let message = self.api.retry_ingestion(file_id).await?;
        info!(file_id = %file_id, message = %message, "Ingestion retry requested");

        self.publish(LifecycleEvent::new(EventTag::ProcessingStarted).with_file(file_id));
        tokio::spawn(poller::watch_activation(
            Arc::clone(&self.api),
            self.bus.clone(),
            file_id,
            self.activation_budget,
            self.cancel.child_token(),
        ));

        Ok(message)
    }

    /// Fetch the append-only error log for a file.
    pub async fn file_errors(&self, file_id: Uuid) -> Result<Vec<rowbox_common::types::FileError>> {
        self.api.file_errors(file_id).await
    }

    // ------------------------------------------------------------------
    // Pipeline steps
    // ------------------------------------------------------------------

    /// Pick the column list to reconcile with: server-extracted columns win,
    /// then local extraction, then synthetic names.
    fn resolve_columns(
        &self,
        server_file: Option<&UploadedFile>,
        bytes: &[u8],
        format: FileFormat,
    ) -> Vec<String> {
        if let Some(columns) = server_file.and_then(UploadedFile::columns) {
            return columns.to_vec();
        }

        let columns = headers::extract_headers(self.parser.as_ref(), bytes, format);
        if columns.is_empty() {
            warn!("No columns extractable; substituting synthetic names");
            return headers::synthetic_columns(1);
        }
        columns
    }

    async fn fetch_active_schema(&self) -> Option<Schema> {
        match self.api.schemas(self.project_id).await {
            Ok(schemas) => schemas.into_iter().find(|s| s.is_active),
            Err(error) => {
                // Best-effort: degrade to "no schema" rather than blocking.
                warn!(error = %error, "Schema fetch failed; proceeding without an active schema");
                None
            }
        }
    }

    async fn auto_create_schema(
        &self,
        file_id: Uuid,
        filename: &str,
        columns: &[String],
        schema_columns: Vec<rowbox_common::types::SchemaColumn>,
    ) -> Result<MappingResolution> {
        let request = CreateSchemaRequest {
            name: AUTO_SCHEMA_NAME.to_string(),
            project_id: self.project_id,
            columns: schema_columns,
            is_active: true,
        };

        let schema = match self.api.create_schema(&request).await {
            Ok(schema) => schema,
            Err(e) => {
                return Err(self.fail(
                    Stage::SchemaReconciliation,
                    Some(file_id),
                    filename,
                    PipelineError::schema_persist(e.to_string()),
                ))
            }
        };

        info!(schema_id = %schema.id, columns = schema.columns.len(), "Schema auto-created");
        self.publish(
            LifecycleEvent::new(EventTag::SchemaCreated)
                .with_file(file_id)
                .with_project(self.project_id)
                .with_data(json!({ "schema_id": schema.id, "columns": schema.columns.len() })),
        );

        let mappings: BTreeMap<String, String> =
            columns.iter().map(|c| (c.clone(), c.clone())).collect();
        self.persist_mapping(file_id, filename, schema.id, mappings, 0).await?;

        Ok(MappingResolution::SchemaCreated { schema })
    }

    async fn auto_map(
        &self,
        file_id: Uuid,
        filename: &str,
        schema_id: Uuid,
        mappings: BTreeMap<String, String>,
    ) -> Result<MappingResolution> {
        debug!(file_id = %file_id, schema_id = %schema_id, "All columns known; auto-mapping identity");
        self.persist_mapping(file_id, filename, schema_id, mappings, 0).await?;
        Ok(MappingResolution::AutoMapped { schema_id })
    }

    /// Run the manual-mapping round-trip. Returns `None` when the prompt was
    /// already opened for this file by an earlier invocation.
    async fn manual_map(
        &self,
        file_id: Uuid,
        filename: &str,
        columns: &[String],
        new_columns: Vec<String>,
        schema: Schema,
    ) -> Result<Option<MappingResolution>> {
        self.publish(
            LifecycleEvent::new(EventTag::UploadProgress)
                .with_file(file_id)
                .with_file_name(filename)
                .with_data(json!({ "new_columns": new_columns })),
        );

        {
            let mut processed = self.lock_processed();
            if !processed.insert(file_id) {
                info!(file_id = %file_id, "Manual mapping already pending; not reopening the prompt");
                return Ok(None);
            }
        }

        let suggestions = mapping::suggest(columns, &schema.columns);
        let prompt_request = MappingPromptRequest {
            file_id,
            file_name: filename.to_string(),
            file_columns: columns.to_vec(),
            new_columns,
            schema: schema.clone(),
            suggestions,
        };

        let decisions = match self.prompt.resolve(prompt_request).await {
            Ok(decisions) => decisions,
            Err(e) => return Err(self.fail(Stage::MappingCommit, Some(file_id), filename, e)),
        };

        let outcome = mapping::commit(file_id, &schema, &decisions);

        if !outcome.added_columns.is_empty() {
            let update = UpdateSchemaRequest {
                columns: outcome.schema.columns.clone(),
            };
            if let Err(e) = self.api.update_schema(schema.id, &update).await {
                return Err(self.fail(
                    Stage::MappingCommit,
                    Some(file_id),
                    filename,
                    PipelineError::schema_persist(e.to_string()),
                ));
            }
            self.publish(
                LifecycleEvent::new(EventTag::SchemaUpdated)
                    .with_file(file_id)
                    .with_project(self.project_id)
                    .with_data(json!({
                        "schema_id": schema.id,
                        "columns_added": outcome.added_columns.len(),
                    })),
            );
        }

        let new_columns_added = outcome.mapping.new_columns_added;
        self.persist_mapping(
            file_id,
            filename,
            schema.id,
            outcome.mapping.mappings,
            new_columns_added,
        )
        .await?;

        Ok(Some(MappingResolution::ManuallyMapped {
            schema_id: schema.id,
            new_columns_added,
            warnings: outcome.warnings,
        }))
    }

    async fn persist_mapping(
        &self,
        file_id: Uuid,
        filename: &str,
        schema_id: Uuid,
        mappings: BTreeMap<String, String>,
        new_columns_added: usize,
    ) -> Result<()> {
        let record = ColumnMapping {
            file_id,
            schema_id,
            mappings,
            new_columns_added,
        };

        if let Err(e) = self.api.save_column_mapping(&record).await {
            return Err(self.fail(
                Stage::MappingCommit,
                Some(file_id),
                filename,
                PipelineError::mapping_save(e.to_string()),
            ));
        }

        self.publish(
            LifecycleEvent::new(EventTag::MappingCompleted)
                .with_file(file_id)
                .with_data(json!({
                    "schema_id": schema_id,
                    "new_columns_added": new_columns_added,
                })),
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reporting helpers
    // ------------------------------------------------------------------

    fn publish(&self, event: LifecycleEvent) {
        self.bus.publish(&event);
    }

    /// Record a fatal pipeline failure as a `file:error` event and hand the
    /// error back for propagation.
    fn fail(
        &self,
        stage: Stage,
        file_id: Option<Uuid>,
        filename: &str,
        error: PipelineError,
    ) -> PipelineError {
        warn!(stage = %stage, file = %filename, error = %error, "Pipeline step failed");

        let mut event = LifecycleEvent::new(EventTag::FileError)
            .with_file_name(filename)
            .with_data(json!({ "stage": stage.as_str() }))
            .with_error(error.to_string());
        if let Some(id) = file_id {
            event = event.with_file(id);
        }
        self.publish(event);
        error
    }

    /// Best-effort fetch of the server-side error log, published as
    /// individual `file:error` events.
    async fn surface_server_errors(&self, file_id: Uuid) {
        match self.api.file_errors(file_id).await {
            Ok(errors) => {
                for error in errors {
                    let data = serde_json::to_value(&error).unwrap_or_default();
                    self.publish(
                        LifecycleEvent::new(EventTag::FileError)
                            .with_file(file_id)
                            .with_data(data)
                            .with_error(error.message),
                    );
                }
            }
            Err(error) => debug!(file_id = %file_id, error = %error, "Could not fetch server error log"),
        }
    }

    fn lock_processed(&self) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
        match self.processed_file_ids.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
