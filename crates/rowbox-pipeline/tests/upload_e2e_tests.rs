//! End-to-end tests for the upload pipeline
//!
//! These tests drive the full coordinator state machine against a mocked
//! Rowbox server:
//! - Empty project: schema auto-creation and identity mapping
//! - Known columns: silent auto-map with no prompt
//! - New column: manual mapping that grows the schema
//! - Lifecycle event ordering on the bus

use async_trait::async_trait;
use chrono::Utc;
use rowbox_common::types::FileFormat;
use rowbox_pipeline::api::ApiClient;
use rowbox_pipeline::coordinator::{
    MappingPrompt, MappingPromptRequest, MappingResolution, UploadCoordinator, UploadRequest,
};
use rowbox_pipeline::headers::{Parser, Preview};
use rowbox_pipeline::mapping::MappingDecision;
use rowbox_pipeline::poller::PollBudget;
use rowbox_pipeline::{EventBus, EventTag};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

const FILE_ID: Uuid = Uuid::from_u128(0x1111_2222_3333_4444_5555_6666_7777_8888);
const SCHEMA_ID: Uuid = Uuid::from_u128(0xaaaa_bbbb_cccc_dddd_0000_1111_2222_3333);

fn upload_response(file_id: Uuid, duplicate: bool) -> serde_json::Value {
    json!({
        "success": true,
        "data": { "duplicate": duplicate, "file_id": file_id }
    })
}

fn status_response(file_id: Uuid, status: &str, columns: &[&str]) -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "file": {
                "id": file_id,
                "filename": "sales.csv",
                "size_bytes": 64,
                "format": "csv",
                "status": status,
                "metadata": { "columns": columns },
                "uploaded_at": Utc::now().to_rfc3339(),
            }
        }
    })
}

fn schema_json(id: Uuid, names: &[&str]) -> serde_json::Value {
    json!({
        "id": id,
        "name": "default",
        "columns": names
            .iter()
            .map(|n| json!({ "name": n, "type": "text", "is_required": false }))
            .collect::<Vec<_>>(),
        "is_active": true,
    })
}

fn schemas_response(schemas: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "success": true, "data": { "schemas": schemas } })
}

fn mapping_saved_response(new_columns_added: usize) -> serde_json::Value {
    json!({ "success": true, "data": { "new_columns_added": new_columns_added } })
}

/// Parser double yielding a fixed CSV header.
struct FixedHeaderParser(Vec<&'static str>);

impl Parser for FixedHeaderParser {
    fn preview(
        &self,
        _bytes: &[u8],
        _format: FileFormat,
        _max_rows: usize,
    ) -> anyhow::Result<Preview> {
        Ok(Preview {
            header: Some(self.0.iter().map(|s| s.to_string()).collect()),
            first_row: None,
        })
    }
}

/// Prompt double returning scripted decisions and counting invocations.
struct ScriptedPrompt {
    decisions: Vec<MappingDecision>,
    invocations: AtomicUsize,
}

impl ScriptedPrompt {
    fn new(decisions: Vec<MappingDecision>) -> Self {
        Self {
            decisions,
            invocations: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MappingPrompt for ScriptedPrompt {
    async fn resolve(
        &self,
        _request: MappingPromptRequest,
    ) -> rowbox_pipeline::Result<Vec<MappingDecision>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(self.decisions.clone())
    }
}

fn coordinator_for(
    server: &MockServer,
    parser_columns: Vec<&'static str>,
    prompt: Arc<ScriptedPrompt>,
) -> UploadCoordinator {
    let api = Arc::new(ApiClient::new(server.uri()).unwrap());
    let budget = PollBudget {
        interval: Duration::from_millis(1),
        max_attempts: 2,
    };
    UploadCoordinator::new(
        api,
        Arc::new(FixedHeaderParser(parser_columns)),
        prompt,
        EventBus::new(),
    )
    .with_budgets(budget, budget)
}

fn csv_request(filename: &str, body: &str) -> UploadRequest {
    UploadRequest {
        filename: filename.to_string(),
        bytes: body.as_bytes().to_vec(),
        modified_at: Utc::now(),
        content_type: Some("text/csv".to_string()),
    }
}

async fn mount_activation(server: &MockServer, file_id: Uuid) {
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/files/{}/activate", file_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "data": {}
        })))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Empty Project: Auto-Create
// ============================================================================

#[tokio::test]
async fn test_first_upload_auto_creates_schema_and_activates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upload_response(FILE_ID, false)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/files/{}/status", FILE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_response(
            FILE_ID,
            "active",
            &["name", "email", "amount"],
        )))
        .mount(&server)
        .await;

    // No schema yet: the list is fetched once up front and once as the
    // create-if-absent guard.
    Mock::given(method("GET"))
        .and(path("/api/v1/schemas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schemas_response(Vec::new())))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/schemas"))
        .and(body_partial_json(json!({
            "is_active": true,
            "columns": [
                { "name": "name", "type": "text" },
                { "name": "email", "type": "text" },
                { "name": "amount", "type": "text" },
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": schema_json(SCHEMA_ID, &["name", "email", "amount"]),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/column-mappings"))
        .and(body_partial_json(json!({
            "file_id": FILE_ID,
            "schema_id": SCHEMA_ID,
            "mappings": { "name": "name", "email": "email", "amount": "amount" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mapping_saved_response(0)))
        .expect(1)
        .mount(&server)
        .await;

    mount_activation(&server, FILE_ID).await;

    let prompt = Arc::new(ScriptedPrompt::new(Vec::new()));
    let coordinator = coordinator_for(&server, vec!["name", "email", "amount"], prompt.clone());

    let outcome = coordinator
        .upload(csv_request("sales.csv", "name,email,amount\nada,a@x.io,3\n"))
        .await
        .unwrap();

    assert_eq!(outcome.file_id, FILE_ID);
    assert!(!outcome.duplicate);
    assert_eq!(outcome.columns, vec!["name", "email", "amount"]);
    match outcome.resolution {
        MappingResolution::SchemaCreated { schema } => {
            assert_eq!(schema.id, SCHEMA_ID);
            assert_eq!(schema.columns.len(), 3);
        }
        other => panic!("expected SchemaCreated, got {:?}", other),
    }
    assert_eq!(prompt.invocations.load(Ordering::SeqCst), 0);

    // The activation watch observes "active" on its first poll.
    assert!(outcome.activation_watch.unwrap().await.unwrap());
}

// ============================================================================
// Known Columns: Auto-Map
// ============================================================================

#[tokio::test]
async fn test_known_columns_auto_map_without_manual_step() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upload_response(FILE_ID, false)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/files/{}/status", FILE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_response(
            FILE_ID,
            "active",
            &["name", "email"],
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/schemas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schemas_response(vec![
            schema_json(SCHEMA_ID, &["name", "email", "amount"]),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/column-mappings"))
        .and(body_partial_json(json!({
            "mappings": { "name": "name", "email": "email" },
            "new_columns_added": 0,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mapping_saved_response(0)))
        .expect(1)
        .mount(&server)
        .await;

    mount_activation(&server, FILE_ID).await;

    let prompt = Arc::new(ScriptedPrompt::new(Vec::new()));
    let coordinator = coordinator_for(&server, vec!["name", "email"], prompt.clone());

    let outcome = coordinator
        .upload(csv_request("sales2.csv", "name,email\nada,a@x.io\n"))
        .await
        .unwrap();

    match outcome.resolution {
        MappingResolution::AutoMapped { schema_id } => assert_eq!(schema_id, SCHEMA_ID),
        other => panic!("expected AutoMapped, got {:?}", other),
    }
    assert_eq!(prompt.invocations.load(Ordering::SeqCst), 0);
    assert!(outcome.activation_watch.unwrap().await.unwrap());
}

// ============================================================================
// New Column: Manual Mapping Grows the Schema
// ============================================================================

#[tokio::test]
async fn test_new_column_manual_mapping_grows_schema() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upload_response(FILE_ID, false)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/files/{}/status", FILE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_response(
            FILE_ID,
            "active",
            &["name", "email", "amount", "region"],
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/schemas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schemas_response(vec![
            schema_json(SCHEMA_ID, &["name", "email", "amount"]),
        ])))
        .mount(&server)
        .await;

    // The append-only update carries all four columns.
    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/schemas/{}", SCHEMA_ID)))
        .and(body_partial_json(json!({
            "columns": [
                { "name": "name" },
                { "name": "email" },
                { "name": "amount" },
                { "name": "region", "type": "text", "is_required": false },
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": schema_json(SCHEMA_ID, &["name", "email", "amount", "region"]),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/column-mappings"))
        .and(body_partial_json(json!({
            "mappings": {
                "name": "name",
                "email": "email",
                "amount": "amount",
                "region": "region",
            },
            "new_columns_added": 1,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mapping_saved_response(1)))
        .expect(1)
        .mount(&server)
        .await;

    mount_activation(&server, FILE_ID).await;

    let prompt = Arc::new(ScriptedPrompt::new(vec![
        MappingDecision::map_to("name", "name"),
        MappingDecision::map_to("email", "email"),
        MappingDecision::map_to("amount", "amount"),
        MappingDecision::add("region"),
    ]));
    let coordinator = coordinator_for(
        &server,
        vec!["name", "email", "amount", "region"],
        prompt.clone(),
    );

    let outcome = coordinator
        .upload(csv_request(
            "sales3.csv",
            "name,email,amount,region\nada,a@x.io,3,emea\n",
        ))
        .await
        .unwrap();

    match outcome.resolution {
        MappingResolution::ManuallyMapped {
            schema_id,
            new_columns_added,
            warnings,
        } => {
            assert_eq!(schema_id, SCHEMA_ID);
            assert_eq!(new_columns_added, 1);
            assert!(warnings.is_empty());
        }
        other => panic!("expected ManuallyMapped, got {:?}", other),
    }
    assert_eq!(prompt.invocations.load(Ordering::SeqCst), 1);
    assert!(outcome.activation_watch.unwrap().await.unwrap());
}

// ============================================================================
// Lifecycle Events
// ============================================================================

#[tokio::test]
async fn test_lifecycle_events_arrive_in_pipeline_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upload_response(FILE_ID, false)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/files/{}/status", FILE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_response(
            FILE_ID,
            "active",
            &["name"],
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/schemas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schemas_response(vec![
            schema_json(SCHEMA_ID, &["name"]),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/column-mappings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mapping_saved_response(0)))
        .mount(&server)
        .await;

    mount_activation(&server, FILE_ID).await;

    let prompt = Arc::new(ScriptedPrompt::new(Vec::new()));
    let coordinator = coordinator_for(&server, vec!["name"], prompt);

    let tags = Arc::new(Mutex::new(Vec::new()));
    let sink = tags.clone();
    let _sub = coordinator.bus().subscribe(EventTag::Wildcard, move |event| {
        sink.lock().unwrap().push(event.tag);
    });

    let outcome = coordinator
        .upload(csv_request("sales.csv", "name\nada\n"))
        .await
        .unwrap();
    assert!(outcome.activation_watch.unwrap().await.unwrap());

    let tags = tags.lock().unwrap().clone();
    let position = |tag| tags.iter().position(|t| *t == tag);

    let started = position(EventTag::UploadStarted).unwrap();
    let mapped = position(EventTag::MappingCompleted).unwrap();
    let activation = position(EventTag::ActivationStarted).unwrap();
    let completed = position(EventTag::UploadCompleted).unwrap();
    assert!(started < mapped);
    assert!(mapped < activation);
    assert!(activation < completed);

    // The detached watch reports completion after observing "active".
    assert!(position(EventTag::ActivationCompleted).is_some());
    assert!(position(EventTag::FileError).is_none());
}

// ============================================================================
// Duplicate Suppression
// ============================================================================

#[tokio::test]
async fn test_duplicate_of_active_file_short_circuits() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upload_response(FILE_ID, true)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/files/{}/status", FILE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_response(
            FILE_ID,
            "active",
            &["name"],
        )))
        .mount(&server)
        .await;

    let prompt = Arc::new(ScriptedPrompt::new(Vec::new()));
    let coordinator = coordinator_for(&server, vec!["name"], prompt);

    let outcome = coordinator
        .upload(csv_request("sales.csv", "name\nada\n"))
        .await
        .unwrap();

    assert!(outcome.duplicate);
    assert_eq!(outcome.file_id, FILE_ID);
    assert!(matches!(outcome.resolution, MappingResolution::AlreadyActive));
    assert!(outcome.activation_watch.is_none());
    // No schema, mapping, or activation calls were mounted; any such request
    // would have failed the upload.
}
