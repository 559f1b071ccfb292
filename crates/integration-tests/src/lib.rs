//! Integration tests for the reman storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p reman-integration-tests
//! ```
//!
//! No external services are needed: Shopify and the KV store are replaced by
//! `wiremock` servers, and the router is driven in-process with
//! `tower::ServiceExt::oneshot`.
//!
//! # Test Categories
//!
//! - `storefront_auth` - Customer login, callback, refresh and logout
//! - `storefront_products` - Product page, option updates and cart
//! - `storefront_kv` - Legacy redirects and vehicle filters

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::SecretString;
use tower::ServiceExt;
use url::Url;
use wiremock::MockServer;

use reman_storefront::config::{KvConfig, ShopifyConfig, StorePrefix, StorefrontConfig};
use reman_storefront::routes;
use reman_storefront::state::AppState;

/// Public origin the test storefront runs under.
pub const ORIGIN: &str = "https://shop.example";

/// Signing secret for the login cookies.
pub const SESSION_SECRET: &str = "k3y-for-signing-login-cookies-0123456789";

/// Storefront configuration pointing every upstream at mock servers.
///
/// Shopify's Storefront and Customer Account APIs share `shopify`.
///
/// # Panics
///
/// Panics if a mock server URI is not a URL.
#[must_use]
pub fn config(shopify: &MockServer, kv: Option<&MockServer>) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().expect("valid IP"),
        port: 3000,
        origin: Url::parse(ORIGIN).expect("valid origin"),
        site_name: "Reman Engine".to_string(),
        store_prefix: StorePrefix::RemanEngine,
        session_secret: SecretString::from(SESSION_SECRET),
        shopify: ShopifyConfig {
            store_domain: shopify.uri(),
            api_version: "2024-10".to_string(),
            storefront_access_token: SecretString::from("storefront-token"),
            customer_client_id: "client-123".to_string(),
            customer_api_url: Url::parse(&shopify.uri()).expect("valid mock URI"),
        },
        kv: kv.map(|server| KvConfig {
            url: server.uri(),
            token: SecretString::from("kv-token"),
        }),
        redirects_enabled: kv.is_some(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The storefront router with its middleware stack, without rate limiting.
///
/// # Panics
///
/// Panics if the application state cannot be built.
#[must_use]
pub fn app(config: StorefrontConfig) -> Router {
    let state = AppState::new(config).expect("Failed to build application state");
    routes::app(state.clone(), routes::routes(&state))
}

/// Send one request through the router.
///
/// # Panics
///
/// Panics if the router fails, which it never does for axum routers.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("router is infallible")
}

/// `GET` request with an optional `Cookie` header.
///
/// # Panics
///
/// Panics if the URI is invalid.
#[must_use]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("valid request")
}

/// `POST` request with a form body.
///
/// # Panics
///
/// Panics if the URI is invalid.
#[must_use]
pub fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("valid request")
}

/// Every `Set-Cookie` on a response as `(name, value)`, in header order.
#[must_use]
pub fn set_cookies(response: &Response<Body>) -> Vec<(String, String)> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// The value a response sets for `name`, if any.
#[must_use]
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

/// A `Cookie` request header carrying every non-empty cookie in `pairs`.
#[must_use]
pub fn cookie_header(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Read a JSON response body.
///
/// # Panics
///
/// Panics if the body cannot be read or is not JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// An ID token with the given claims and a dummy signature.
#[must_use]
pub fn unsigned_id_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
