//! Integration tests for KV-backed legacy redirects and vehicle filters.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reman_integration_tests::{app, config, get, json_body, location, send};

async fn mount_key(kv: &MockServer, key: &str, result: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("Authorization", "Bearer kv-token"))
        .and(body_json(serde_json::json!(["GET", key])))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": result })))
        .mount(kv)
        .await;
}

async fn mount_miss(kv: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": null })))
        .mount(kv)
        .await;
}

// =============================================================================
// Redirects
// =============================================================================

#[tokio::test]
async fn test_legacy_path_redirects_permanently() {
    let shopify = MockServer::start().await;
    let kv = MockServer::start().await;
    mount_key(&kv, "re./engines/gm?tag=ls&code=53", serde_json::json!("/product/ls-53")).await;
    let app = app(config(&shopify, Some(&kv)));

    let response = send(&app, get("/engines/gm?utm_source=mail&code=53&tag=ls", None)).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), Some("/product/ls-53?utm_source=mail"));
}

#[tokio::test]
async fn test_redirect_miss_falls_through() {
    let shopify = MockServer::start().await;
    let kv = MockServer::start().await;
    mount_miss(&kv).await;
    let app = app(config(&shopify, Some(&kv)));

    let response = send(&app, get("/engines/unknown", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_kv_failure_is_a_miss() {
    let shopify = MockServer::start().await;
    let kv = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&kv)
        .await;
    let app = app(config(&shopify, Some(&kv)));

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/engines/gm", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_excluded_paths_skip_lookup() {
    let shopify = MockServer::start().await;
    let kv = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&kv)
        .await;
    let app = app(config(&shopify, Some(&kv)));

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Filters
// =============================================================================

#[tokio::test]
async fn test_filters_from_kv() {
    let shopify = MockServer::start().await;
    let kv = MockServer::start().await;
    mount_key(
        &kv,
        "re.makes",
        serde_json::json!(r#"[{"label":"Chevrolet","value":"chevrolet"}]"#),
    )
    .await;
    mount_key(
        &kv,
        "re.models",
        serde_json::json!([{ "label": "Silverado", "value": "silverado", "parent": "chevrolet" }]),
    )
    .await;
    mount_miss(&kv).await;
    let app = app(config(&shopify, Some(&kv)));

    let response = send(&app, get("/api/filters", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let filters = json_body(response).await;
    assert_eq!(filters["makes"][0]["label"], "Chevrolet");
    assert_eq!(filters["models"][0]["parent"], "chevrolet");
    assert_eq!(filters["years"].as_array().unwrap().len(), 0);
    assert_eq!(filters["partTypes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_filters_without_kv_are_empty() {
    let shopify = MockServer::start().await;
    let app = app(config(&shopify, None));

    let filters = json_body(send(&app, get("/api/filters", None)).await).await;
    assert_eq!(filters["makes"].as_array().unwrap().len(), 0);
}
