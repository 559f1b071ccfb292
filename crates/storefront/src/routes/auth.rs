//! Shopify Customer Account OAuth route handlers.
//!
//! - Login: stores signed PKCE cookies and redirects to Shopify's authorize page
//! - Callback: verifies state and nonce, exchanges the code and sets the session cookies
//! - Logout: clears every customer cookie and redirects to Shopify logout

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::services::auth::cookies::{self, append_set_cookies, read_cookies};
use crate::services::auth::{AuthRedirect, CallbackParams, SessionCookies};
use crate::state::AppState;

/// Response header telling the edge whether the callback admitted the customer.
pub const SHOP_ACCESS_HEADER: &str = "x-shop-access";

/// Redirect carrying the cookies the auth step asked for.
fn redirect_with_cookies(redirect: &AuthRedirect) -> Response {
    let mut response = Redirect::to(&redirect.url).into_response();
    append_set_cookies(response.headers_mut(), &redirect.cookies);
    response
}

/// Initiate Shopify Customer Account OAuth login.
///
/// # Route
///
/// `GET /auth/login`
#[instrument(skip(state))]
pub async fn login(State(state): State<AppState>) -> Response {
    let now_secs = chrono::Utc::now().timestamp();
    let redirect = state.sessions().begin_login(now_secs);
    redirect_with_cookies(&redirect)
}

/// Handle the OAuth callback from Shopify.
///
/// On success the session cookies are set and the customer lands on
/// `/account`. On failure no session cookie is written; the single-use login
/// cookies are cleared either way.
///
/// # Route
///
/// `GET /api/authorize`
#[instrument(skip_all)]
pub async fn authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let request_cookies = read_cookies(&headers);
    let now_ms = chrono::Utc::now().timestamp_millis();

    match state
        .sessions()
        .complete_login(&params, &request_cookies, now_ms)
        .await
    {
        Ok(session) => {
            let mut response = Redirect::to(&state.sessions().account_url()).into_response();
            append_set_cookies(response.headers_mut(), &session.cookies);
            response
                .headers_mut()
                .insert(SHOP_ACCESS_HEADER, HeaderValue::from_static("allowed"));
            response
        }
        Err(e) => {
            tracing::warn!(error = %e, "Customer login rejected");
            let mut response = AppError::from(e).into_response();
            let removals: Vec<_> = cookies::LOGIN_COOKIES
                .into_iter()
                .map(cookies::removal)
                .collect();
            append_set_cookies(response.headers_mut(), &removals);
            response
                .headers_mut()
                .insert(SHOP_ACCESS_HEADER, HeaderValue::from_static("denied"));
            response
        }
    }
}

/// Log out the customer.
///
/// # Route
///
/// `GET /auth/logout`, `POST /auth/logout`
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = SessionCookies::from_headers(&headers);
    clear_sentry_user();
    redirect_with_cookies(&state.sessions().logout(&session))
}
