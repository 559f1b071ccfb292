//! Legacy URL redirect middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::services::redirects;
use crate::state::AppState;

/// Path prefixes that never carry legacy redirects.
const EXCLUDED_PREFIXES: [&str; 6] = ["/account", "/api", "/product", "/cart", "/static", "/health"];

fn is_excluded(path: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Answer `301` for paths with a stored redirect.
///
/// Active only when redirects are enabled, the store keeps redirects and a
/// KV store is configured.
pub async fn redirect_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let config = state.config();
    let path = request.uri().path();

    if !config.redirects_enabled || !config.store_prefix.has_redirects() || is_excluded(path) {
        return next.run(request).await;
    }
    let Some(kv) = state.kv() else {
        return next.run(request).await;
    };

    let code = config.store_prefix.kv_code();
    if let Some(target) = redirects::find(kv, code, path, request.uri().query()).await {
        tracing::debug!(from = %path, to = %target, "Legacy redirect");
        if let Ok(location) = HeaderValue::from_str(&target) {
            return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response();
        }
        tracing::warn!(to = %target, "Redirect target is not a valid header value");
    }

    next.run(request).await
}
