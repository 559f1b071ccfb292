//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Health check
//!
//! # Products (selection in the query string)
//! GET  /product/{handle}         - Product detail (redirects to fill defaults)
//! POST /product/{handle}/options - Apply option changes (303 to the new query)
//! POST /product/{handle}/cart    - Add the current selection to the cart
//!
//! # Cart
//! GET  /cart                     - Cart contents
//! GET  /checkout                 - Redirect to Shopify checkout
//!
//! # Shopify Customer OAuth (rate limited)
//! GET  /auth/login               - Redirect to Shopify OAuth
//! GET  /api/authorize            - Handle OAuth callback
//! GET  /auth/logout              - Logout from Shopify
//! POST /auth/logout              - Logout from Shopify
//!
//! # API
//! GET  /api/filters              - Vehicle filter options
//!
//! # Account (requires customer login)
//! GET  /account                  - Customer profile
//! GET  /account/orders           - Order history
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod cart;
pub mod products;

use axum::{
    Router,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    auth_rate_limiter, create_session_layer, ensure_logged_in, redirect_middleware,
    request_id_middleware,
};
use crate::state::AppState;

/// Create the customer OAuth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(auth::login))
        .route("/api/authorize", get(auth::authorize))
        .route("/auth/logout", get(auth::logout).post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{handle}", get(products::show))
        .route("/{handle}/options", post(products::update_options))
        .route("/{handle}/cart", post(products::add_to_cart))
}

/// Create the account routes router.
///
/// The whole `/account` prefix is guarded by [`ensure_logged_in`], including
/// paths that match no route.
pub fn account_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .fallback(account_not_found)
        .layer(from_fn_with_state(state.clone(), ensure_logged_in))
}

async fn account_not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Create every route except the OAuth ones.
fn storefront_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Product routes
        .nest("/product", product_routes())
        // Cart
        .route("/cart", get(cart::show))
        .route("/checkout", get(cart::checkout))
        // Account routes
        .nest("/account", account_routes(state))
        // API
        .route("/api/filters", get(api::filters::index))
}

/// Create all routes for the storefront.
pub fn routes(state: &AppState) -> Router<AppState> {
    storefront_routes(state).merge(auth_routes())
}

/// Create all routes with the OAuth routes rate limited per client IP.
///
/// The limiter keys on proxy headers, so requests without a client IP header
/// are rejected on those routes.
pub fn rate_limited_routes(state: &AppState) -> Router<AppState> {
    storefront_routes(state).merge(auth_routes().layer(auth_rate_limiter()))
}

/// Apply the per-request middleware stack and the state.
///
/// Layers, innermost first: legacy redirects, the cart session, the request
/// ID, then request tracing.
pub fn app(state: AppState, routes: Router<AppState>) -> Router {
    let session_layer = create_session_layer(state.config());

    routes
        .layer(from_fn_with_state(state.clone(), redirect_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check upstreams.
async fn health() -> &'static str {
    "ok"
}
