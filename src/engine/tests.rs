//! Tests for the sync engine

use super::*;
use crate::config::KpaConfig;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> Arc<KpaClient> {
    let mut config = KpaConfig::new("test-token");
    config.base_url = base_url.to_string();
    config.http.rate_limit = None;
    config.http.max_attempts = 2;
    config.http.backoff.initial_ms = 10;
    Arc::new(KpaClient::new(&config).unwrap())
}

/// Mount the three fixed list endpoints with empty pages
async fn mount_empty_fixed_streams(server: &MockServer) {
    for (endpoint, key) in [
        ("/roles.list", "roles"),
        ("/users.list", "users"),
        ("/linesofbusiness.list", "linesofbusiness"),
    ] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "paging": {"last_page": 1},
                key: []
            })))
            .mount(server)
            .await;
    }
}

async fn mount_single_form(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/forms.list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "forms": [{"id": "f1", "name": "Audit"}]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/forms.info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "form": {"latest": {"fields": [
                {"id": 1, "title": "Name", "type": "string"},
                {"id": 2, "title": "Name", "type": "string"}
            ]}}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_sync_run() {
    let server = MockServer::start().await;
    mount_empty_fixed_streams(&server).await;
    mount_single_form(&server).await;

    Mock::given(method("POST"))
        .and(path("/responses.list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "paging": {"last_page": 1},
            "responses": [{"id": 9, "created": 0, "updated": 700}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/responses.info"))
        .and(body_partial_json(json!({"form_id": "f1", "response_id": 9})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "response": {
                "id": 9, "created": 0, "updated": 0,
                "latest": {"responses": {
                    "1": {"value": {"values": ["x"]}},
                    "2": {"value": {"values": ["y"]}}
                }}
            }
        })))
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(test_client(&server.uri()), StateManager::in_memory());
    let mut sink = CollectingSink::new();
    let stats = engine.sync(None, &mut sink).await.unwrap();

    // One summary plus one detail record.
    let details = sink.stream_records("Audit");
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["kpa_id"], json!(9));
    assert_eq!(details[0]["kpa_created"], json!("1970-01-01T00:00:00+00:00"));
    assert_eq!(details[0]["kpa_updated"], json!("1970-01-01T00:00:00+00:00"));
    assert_eq!(details[0]["Name"], json!("x"));
    assert_eq!(details[0]["Name_2"], json!("y"));

    assert_eq!(sink.stream_records("Audit_responses_list").len(), 1);

    // Schemas were declared for the pair and the fixed streams.
    assert!(sink.schemas.contains_key("Audit"));
    assert!(sink.schemas.contains_key("Audit_responses_list"));
    assert!(sink.schemas.contains_key("roles"));

    // Bookmark advanced to the max updated value and reached both the sink
    // and the state manager.
    assert_eq!(sink.bookmarks.get("Audit_responses_list"), Some(&700));
    assert_eq!(
        engine.state().get_bookmark("Audit_responses_list").await,
        Some(700)
    );

    assert_eq!(stats.records_synced, 2);
    assert_eq!(stats.errors, 0);
    // 3 fixed + the form pair.
    assert_eq!(stats.streams_synced, 5);
}

#[tokio::test]
async fn test_form_discovery_failure_is_isolated() {
    let server = MockServer::start().await;
    mount_empty_fixed_streams(&server).await;

    Mock::given(method("POST"))
        .and(path("/forms.list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "forms": [
                {"id": "bad", "name": "Broken"},
                {"id": "f2", "name": "Fine"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/forms.info"))
        .and(body_partial_json(json!({"form_id": "bad"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/forms.info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "form": {"latest": {"fields": []}}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/responses.list"))
        .and(body_partial_json(json!({"form_id": "f2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "paging": {"last_page": 1},
            "responses": []
        })))
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(test_client(&server.uri()), StateManager::in_memory());
    let mut sink = CollectingSink::new();
    let stats = engine.sync(None, &mut sink).await.unwrap();

    assert_eq!(stats.errors, 1);
    assert!(sink.schemas.contains_key("Fine"));
    assert!(!sink.schemas.contains_key("Broken"));
}

#[tokio::test]
async fn test_forms_list_failure_aborts_run() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forms.list"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(test_client(&server.uri()), StateManager::in_memory());
    let mut sink = CollectingSink::new();
    assert!(engine.sync(None, &mut sink).await.is_err());
    assert!(sink.records.is_empty());
}

#[tokio::test]
async fn test_selection_limits_streams() {
    let server = MockServer::start().await;
    mount_empty_fixed_streams(&server).await;
    mount_single_form(&server).await;

    let mut engine = SyncEngine::new(test_client(&server.uri()), StateManager::in_memory());
    let mut sink = CollectingSink::new();
    let selection = vec!["roles".to_string()];
    let stats = engine.sync(Some(&selection), &mut sink).await.unwrap();

    assert_eq!(stats.streams_synced, 1);
    assert!(sink.schemas.contains_key("roles"));
    assert!(!sink.schemas.contains_key("users"));
    assert!(!sink.schemas.contains_key("Audit"));
}

#[tokio::test]
async fn test_unknown_stream_selection_rejected() {
    let server = MockServer::start().await;
    mount_single_form(&server).await;

    let mut engine = SyncEngine::new(test_client(&server.uri()), StateManager::in_memory());
    let mut sink = CollectingSink::new();
    let selection = vec!["nonsense".to_string()];
    let err = engine.sync(Some(&selection), &mut sink).await.unwrap_err();

    assert!(matches!(err, Error::StreamNotFound { stream } if stream == "nonsense"));
}

#[tokio::test]
async fn test_bookmark_beats_start_date_as_lower_bound() {
    let server = MockServer::start().await;
    mount_empty_fixed_streams(&server).await;
    mount_single_form(&server).await;

    // The list endpoint must receive the persisted bookmark, not the
    // configured start date.
    Mock::given(method("POST"))
        .and(path("/responses.list"))
        .and(body_partial_json(json!({"updated_after": 5000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "paging": {"last_page": 1},
            "responses": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = StateManager::from_json(
        r#"{"streams": {"Audit_responses_list": {"bookmark": 5000}}}"#,
    )
    .unwrap();

    let mut engine = SyncEngine::new(test_client(&server.uri()), state).with_config(
        SyncConfig::new().with_start_date_millis(Some(1000)),
    );
    let mut sink = CollectingSink::new();
    let stats = engine.sync(None, &mut sink).await.unwrap();

    assert_eq!(stats.errors, 0);
    // No summaries emitted, so the bookmark stays put.
    assert!(sink.bookmarks.is_empty());
}

#[tokio::test]
async fn test_check_reports_connection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forms.list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "forms": []})),
        )
        .mount(&server)
        .await;

    let engine = SyncEngine::new(test_client(&server.uri()), StateManager::in_memory());
    assert!(engine.check().await.is_ok());
}

#[tokio::test]
async fn test_discover_modes_through_engine() {
    let server = MockServer::start().await;
    mount_single_form(&server).await;

    let engine = SyncEngine::new(test_client(&server.uri()), StateManager::in_memory());

    let discovery = engine.discover(CatalogMode::Discovery).await.unwrap();
    assert!(discovery
        .streams
        .iter()
        .all(|s| !s.name.ends_with("_responses_list")));

    let sync = engine.discover(CatalogMode::Sync).await.unwrap();
    assert!(sync
        .streams
        .iter()
        .any(|s| s.name == "Audit_responses_list"));
}
