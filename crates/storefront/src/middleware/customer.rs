//! Customer session guard and extractor.
//!
//! `ensure_logged_in` guards `/account` routes: an active session passes
//! through, an expired one is refreshed once, and anything else is sent to
//! a fresh login with its stale cookies removed.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::services::auth::cookies::{append_set_cookies, clear_all};
use crate::services::auth::{SessionCookies, SessionStatus};
use crate::state::AppState;

/// Where anonymous and failed-refresh requests are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// Customer Account API access token for the current request.
///
/// Only present behind [`ensure_logged_in`].
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(
///     State(state): State<AppState>,
///     CustomerToken(token): CustomerToken,
/// ) -> Result<Json<Customer>> {
///     Ok(Json(state.customer().get_customer(&token).await?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CustomerToken(pub String);

impl<S> FromRequestParts<S> for CustomerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("customer login required".to_string()))
    }
}

/// Require a customer session, refreshing it when expired.
///
/// Refreshed cookies are written on the guarded response. A failed refresh
/// clears every session cookie before redirecting to login.
pub async fn ensure_logged_in(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = SessionCookies::from_headers(request.headers());
    let now_ms = chrono::Utc::now().timestamp_millis();

    match session.status(now_ms) {
        SessionStatus::Active(token) => {
            request.extensions_mut().insert(CustomerToken(token));
            next.run(request).await
        }
        SessionStatus::Anonymous => {
            tracing::debug!(path = %request.uri().path(), "No customer session");
            Redirect::to(LOGIN_PATH).into_response()
        }
        SessionStatus::Expired => match state.sessions().refresh(&session, now_ms).await {
            Ok(refreshed) => {
                request
                    .extensions_mut()
                    .insert(CustomerToken(refreshed.access_token));
                let mut response = next.run(request).await;
                append_set_cookies(response.headers_mut(), &refreshed.cookies);
                response
            }
            Err(e) => {
                tracing::warn!(error = %e, "Customer session refresh failed");
                let mut response = Redirect::to(LOGIN_PATH).into_response();
                append_set_cookies(response.headers_mut(), &clear_all());
                response
            }
        },
    }
}
