//! Tests for the discovery module

use super::*;
use crate::config::KpaConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> KpaClient {
    let mut config = KpaConfig::new("test-token");
    config.base_url = base_url.to_string();
    config.http.rate_limit = None;
    config.http.backoff.initial_ms = 10;
    KpaClient::new(&config).unwrap()
}

#[test]
fn test_sanitize_form_name() {
    assert_eq!(sanitize_form_name("Daily Inspection"), "Daily_Inspection");
    assert_eq!(sanitize_form_name("Near-Miss Report!"), "NearMiss_Report");
    assert_eq!(sanitize_form_name("Audit (v2)"), "Audit_v2");
    assert_eq!(sanitize_form_name("plain"), "plain");
}

#[test]
fn test_field_deserializes_numeric_id() {
    let field: Field =
        serde_json::from_value(json!({"id": 7, "title": "Name", "type": "text"})).unwrap();
    assert_eq!(field.id, "7");
    assert_eq!(field.title, "Name");
    assert_eq!(field.field_type, "text");
    assert!(field.settings.is_empty());
}

#[test]
fn test_form_deserializes_string_id() {
    let form: Form = serde_json::from_value(json!({"id": "abc123", "name": "Audit"})).unwrap();
    assert_eq!(form.id, "abc123");
    assert_eq!(form.stream_name(), "Audit");
}

#[tokio::test]
async fn test_fetch_forms() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forms.list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "forms": [
                {"id": "f1", "name": "Daily Inspection"},
                {"id": "f2", "name": "Near Miss"}
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let forms = fetch_forms(&client).await.unwrap();

    assert_eq!(forms.len(), 2);
    assert_eq!(forms[0].id, "f1");
    assert_eq!(forms[1].stream_name(), "Near_Miss");
}

#[tokio::test]
async fn test_fetch_fields_unwraps_latest_revision() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forms.info"))
        .and(body_partial_json(json!({"form_id": "f1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "form": {"latest": {"fields": [
                {"id": 1, "title": "Name", "type": "text", "settings": {}}
            ]}}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let fields = fetch_fields(&client, "f1").await.unwrap();

    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].id, "1");
}

#[tokio::test]
async fn test_fetch_fields_failure_names_the_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forms.info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = fetch_fields(&client, "f9").await.unwrap_err();

    assert!(err.to_string().contains("form id f9"));
}

#[tokio::test]
async fn test_form_cache_fetches_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forms.info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "form": {"latest": {"fields": [
                {"id": 1, "title": "Name", "type": "text"},
                {"id": 2, "title": "Name", "type": "text"}
            ]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let cache = FormCache::new();
    let form = Form {
        id: "f1".to_string(),
        name: "Audit".to_string(),
    };

    let first = cache.get_or_fetch(&client, &form).await.unwrap();
    let second = cache.get_or_fetch(&client, &form).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.fields.len(), 2);
    assert_eq!(first.resolution.get("2").map(String::as_str), Some("Name_2"));
}
