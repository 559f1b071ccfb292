//! Customer login session manager.
//!
//! Drives the Customer Account OAuth 2.0 + PKCE flow:
//!
//! ```text
//! Anonymous -> AwaitingCallback -> Authenticated
//!                                    |
//!                                 Expired -> RefreshPending -> Authenticated | Anonymous
//! ```
//!
//! Every step returns the cookies it wants written instead of writing them,
//! and only after the whole step succeeded. A failed step returns an
//! [`AuthError`] and no session cookies.

pub mod cookies;
mod error;
pub mod id_token;
pub mod pkce;

pub use cookies::{LoginCookieSigner, SessionCookies};
pub use error::AuthError;
pub use pkce::PkceMaterial;

use std::collections::HashMap;

use serde::Deserialize;
use tower_sessions::cookie::Cookie;
use tracing::instrument;

use crate::shopify::CustomerAccountClient;

/// Seconds taken off `expires_in` so tokens are refreshed before Shopify
/// expires them.
pub const EXPIRY_MARGIN_SECS: i64 = 120;

/// Clock skew allowed when comparing the stored expiry.
const EXPIRY_SKEW_MS: i64 = 1_000;

/// Stored expiry for a token issued at `now_ms` with `expires_in` seconds.
#[must_use]
pub const fn expires_at_ms(now_ms: i64, expires_in: i64) -> i64 {
    now_ms + (expires_in - EXPIRY_MARGIN_SECS) * 1_000
}

/// Whether a stored expiry has passed.
#[must_use]
pub const fn is_expired(expires_at_ms: i64, now_ms: i64) -> bool {
    expires_at_ms - EXPIRY_SKEW_MS < now_ms
}

/// Where a request's session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No usable credentials; a fresh login is needed.
    Anonymous,
    /// The access token has expired or is gone; a refresh is needed.
    Expired,
    /// Valid customer API access token.
    Active(String),
}

impl SessionCookies {
    /// Classify the session at `now_ms`.
    #[must_use]
    pub fn status(&self, now_ms: i64) -> SessionStatus {
        let Some(expires_at) = self.expires_at else {
            return SessionStatus::Anonymous;
        };
        if self.access_token.is_none() && self.refresh_token.is_none() {
            return SessionStatus::Anonymous;
        }
        match &self.access_token {
            Some(token) if !is_expired(expires_at, now_ms) => SessionStatus::Active(token.clone()),
            _ => SessionStatus::Expired,
        }
    }
}

/// Query parameters on the OAuth callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// A redirect plus the cookies to write with it.
#[derive(Debug)]
pub struct AuthRedirect {
    pub url: String,
    pub cookies: Vec<Cookie<'static>>,
}

/// Result of a successful login or refresh.
#[derive(Debug)]
pub struct AuthenticatedSession {
    /// Customer API access token for the rest of this request.
    pub access_token: String,
    pub cookies: Vec<Cookie<'static>>,
}

/// Runs login, callback, refresh and logout.
#[derive(Clone)]
pub struct SessionManager {
    customer: CustomerAccountClient,
    signer: LoginCookieSigner,
    origin: String,
}

impl SessionManager {
    /// Create a session manager for the site at `origin`.
    #[must_use]
    pub fn new(customer: CustomerAccountClient, signer: LoginCookieSigner, origin: &str) -> Self {
        Self {
            customer,
            signer,
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    /// OAuth callback URL registered with Shopify.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}/api/authorize", self.origin)
    }

    /// Post-login landing page.
    #[must_use]
    pub fn account_url(&self) -> String {
        format!("{}/account", self.origin)
    }

    /// Start a login: fresh PKCE material in signed cookies and a redirect
    /// to the authorize endpoint.
    #[must_use]
    pub fn begin_login(&self, now_secs: i64) -> AuthRedirect {
        let material = PkceMaterial::generate();
        let url = self.customer.authorization_url(
            &self.redirect_uri(),
            &material.state,
            &material.nonce,
            &material.challenge,
        );

        AuthRedirect {
            url,
            cookies: vec![
                self.signer
                    .cookie(cookies::VERIFIER, &material.verifier, now_secs),
                self.signer.cookie(cookies::STATE, &material.state, now_secs),
                self.signer.cookie(cookies::NONCE, &material.nonce, now_secs),
            ],
        }
    }

    fn login_cookie(
        &self,
        request_cookies: &HashMap<String, String>,
        name: &'static str,
        now_secs: i64,
    ) -> Result<String, AuthError> {
        let signed = request_cookies
            .get(name)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::InvalidPkceCookie(name))?;
        self.signer.verify(name, signed, now_secs)
    }

    /// Complete a login from the OAuth callback.
    ///
    /// The `state` check happens before any network call; the nonce check
    /// happens before the customer token exchange.
    ///
    /// # Errors
    ///
    /// Returns an `AuthError` for a missing parameter, a forged or expired
    /// login cookie, a state or nonce mismatch, or a token endpoint failure.
    #[instrument(skip_all)]
    pub async fn complete_login(
        &self,
        params: &CallbackParams,
        request_cookies: &HashMap<String, String>,
        now_ms: i64,
    ) -> Result<AuthenticatedSession, AuthError> {
        let now_secs = now_ms / 1_000;

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingParameter("code"))?;
        let state = params
            .state
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingParameter("state"))?;

        let stored_state = self.login_cookie(request_cookies, cookies::STATE, now_secs)?;
        if stored_state != state {
            return Err(AuthError::StateMismatch);
        }

        if !request_cookies.contains_key(cookies::VERIFIER) {
            return Err(AuthError::MissingVerifier);
        }
        let verifier = self.login_cookie(request_cookies, cookies::VERIFIER, now_secs)?;
        let stored_nonce = self.login_cookie(request_cookies, cookies::NONCE, now_secs)?;

        let token = self
            .customer
            .exchange_code(code, &verifier, &self.redirect_uri(), &self.origin)
            .await?;

        let raw_id_token = token
            .id_token
            .as_deref()
            .ok_or_else(|| AuthError::MalformedIdToken("no id_token in response".into()))?;
        if id_token::nonce_claim(raw_id_token)?.as_deref() != Some(stored_nonce.as_str()) {
            return Err(AuthError::NonceMismatch);
        }

        let customer_token = self
            .customer
            .exchange_customer_token(&token.access_token, &self.origin)
            .await?;

        let mut set = session_cookies(
            &customer_token.access_token,
            token.expires_in,
            token.refresh_token.as_deref(),
            now_ms,
        );
        set.push(cookies::build(
            cookies::ID_TOKEN,
            raw_id_token.to_string(),
            cookies::SESSION_MAX_AGE_SECS,
        ));
        set.extend(cookies::LOGIN_COOKIES.into_iter().map(cookies::removal));

        tracing::info!("Customer logged in");

        Ok(AuthenticatedSession {
            access_token: customer_token.access_token,
            cookies: set,
        })
    }

    /// Refresh an expired session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingRefreshToken` without a refresh token, or
    /// `AuthError::TokenEndpoint` if either grant fails.
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        session: &SessionCookies,
        now_ms: i64,
    ) -> Result<AuthenticatedSession, AuthError> {
        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or(AuthError::MissingRefreshToken)?;

        let token = self.customer.refresh(refresh_token, &self.origin).await?;
        let customer_token = self
            .customer
            .exchange_customer_token(&token.access_token, &self.origin)
            .await?;

        let refresh_token = token.refresh_token.as_deref().unwrap_or(refresh_token);
        let set = session_cookies(
            &customer_token.access_token,
            token.expires_in,
            Some(refresh_token),
            now_ms,
        );

        tracing::debug!("Customer session refreshed");

        Ok(AuthenticatedSession {
            access_token: customer_token.access_token,
            cookies: set,
        })
    }

    /// Log out: clear every cookie and leave through the provider logout
    /// when an ID token is known.
    #[must_use]
    pub fn logout(&self, session: &SessionCookies) -> AuthRedirect {
        let url = session.id_token.as_deref().map_or_else(
            || self.origin.clone(),
            |id_token| self.customer.logout_url(id_token, &self.origin),
        );

        AuthRedirect {
            url,
            cookies: cookies::clear_all(),
        }
    }
}

/// Access token, refresh token and expiry cookies.
///
/// `expires_in` is the lifetime granted by the authorization-code or refresh
/// grant, not the customer token exchange.
fn session_cookies(
    access_token: &str,
    expires_in: i64,
    refresh_token: Option<&str>,
    now_ms: i64,
) -> Vec<Cookie<'static>> {
    let mut out = vec![
        cookies::build(cookies::ACCESS_TOKEN, access_token.to_string(), expires_in),
        cookies::build(
            cookies::EXPIRES_AT,
            expires_at_ms(now_ms, expires_in).to_string(),
            cookies::SESSION_MAX_AGE_SECS,
        ),
    ];
    if let Some(refresh_token) = refresh_token {
        out.push(cookies::build(
            cookies::REFRESH_TOKEN,
            refresh_token.to_string(),
            cookies::SESSION_MAX_AGE_SECS,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use secrecy::SecretString;
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ShopifyConfig;

    const NOW_MS: i64 = 1_700_000_000_000;
    const NOW_SECS: i64 = NOW_MS / 1_000;

    fn manager(url: &str) -> SessionManager {
        let config = ShopifyConfig {
            store_domain: "reman.myshopify.com".to_string(),
            api_version: "2024-10".to_string(),
            storefront_access_token: SecretString::from("storefront-token"),
            customer_client_id: "client-123".to_string(),
            customer_api_url: Url::parse(url).unwrap(),
        };
        let signer =
            LoginCookieSigner::new(&SecretString::from("k3y-for-signing-login-cookies-0123456789"))
                .unwrap();
        SessionManager::new(
            CustomerAccountClient::new(&config),
            signer,
            "https://shop.example/",
        )
    }

    fn login_cookies(manager: &SessionManager, state: &str, nonce: &str) -> HashMap<String, String> {
        [
            (cookies::STATE, state),
            (cookies::NONCE, nonce),
            (cookies::VERIFIER, "verifier"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), manager.signer.sign(name, value, NOW_SECS)))
        .collect()
    }

    fn set_cookie_names<'a>(cookies: &'a [Cookie<'static>]) -> Vec<&'a str> {
        cookies
            .iter()
            .filter(|c| !c.value().is_empty())
            .map(Cookie::name)
            .collect()
    }

    async fn mount_token_endpoint(server: &MockServer, nonce: &str) {
        let id_token = id_token::unsigned_token(&serde_json::json!({ "nonce": nonce }));
        Mock::given(method("POST"))
            .and(path("/auth/oauth/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "oauth-access",
                "expires_in": 3600,
                "id_token": id_token,
                "refresh_token": "refresh-1"
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/oauth/token"))
            .and(body_string_contains("grant_type=urn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "customer-access",
                "expires_in": 7200
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_expiry_arithmetic() {
        assert_eq!(expires_at_ms(NOW_MS, 7200), NOW_MS + (7200 - 120) * 1000);
        assert!(!is_expired(NOW_MS + 5_000, NOW_MS));
        assert!(is_expired(NOW_MS + 500, NOW_MS));
    }

    #[test]
    fn test_session_status() {
        let mut session = SessionCookies {
            access_token: Some("at".into()),
            refresh_token: Some("rt".into()),
            expires_at: Some(NOW_MS + 60_000),
            id_token: None,
        };
        assert_eq!(session.status(NOW_MS), SessionStatus::Active("at".into()));

        session.expires_at = Some(NOW_MS - 1);
        assert_eq!(session.status(NOW_MS), SessionStatus::Expired);

        session.access_token = None;
        session.expires_at = Some(NOW_MS + 60_000);
        assert_eq!(session.status(NOW_MS), SessionStatus::Expired);

        session.expires_at = None;
        assert_eq!(session.status(NOW_MS), SessionStatus::Anonymous);
        assert_eq!(SessionCookies::default().status(NOW_MS), SessionStatus::Anonymous);
    }

    #[test]
    fn test_begin_login_sets_signed_cookies() {
        let manager = manager("https://shopify.com/1234");
        let redirect = manager.begin_login(NOW_SECS);
        assert!(redirect.url.starts_with("https://shopify.com/1234/auth/oauth/authorize?"));
        assert_eq!(
            set_cookie_names(&redirect.cookies),
            [cookies::VERIFIER, cookies::STATE, cookies::NONCE]
        );

        let url = Url::parse(&redirect.url).unwrap();
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let state_cookie = redirect
            .cookies
            .iter()
            .find(|c| c.name() == cookies::STATE)
            .unwrap();
        assert_eq!(
            manager
                .signer
                .verify(cookies::STATE, state_cookie.value(), NOW_SECS)
                .unwrap(),
            state
        );
    }

    #[tokio::test]
    async fn test_state_mismatch_never_calls_token_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let manager = manager(&server.uri());
        let params = CallbackParams {
            code: Some("code".into()),
            state: Some("forged".into()),
        };
        let result = manager
            .complete_login(&params, &login_cookies(&manager, "expected", "n"), NOW_MS)
            .await;
        assert!(matches!(result, Err(AuthError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_nonce_mismatch_fails_closed() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "someone-elses-nonce").await;

        let manager = manager(&server.uri());
        let params = CallbackParams {
            code: Some("code".into()),
            state: Some("st".into()),
        };
        let result = manager
            .complete_login(&params, &login_cookies(&manager, "st", "mine"), NOW_MS)
            .await;
        assert!(matches!(result, Err(AuthError::NonceMismatch)));
    }

    #[tokio::test]
    async fn test_complete_login_writes_session() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "mine").await;

        let manager = manager(&server.uri());
        let params = CallbackParams {
            code: Some("code".into()),
            state: Some("st".into()),
        };
        let session = manager
            .complete_login(&params, &login_cookies(&manager, "st", "mine"), NOW_MS)
            .await
            .unwrap();

        assert_eq!(session.access_token, "customer-access");
        let expires = session
            .cookies
            .iter()
            .find(|c| c.name() == cookies::EXPIRES_AT)
            .unwrap();
        // 3600 from the code grant, not 7200 from the customer token exchange
        assert_eq!(expires.value(), (NOW_MS + 3_480_000).to_string());
        let access = session
            .cookies
            .iter()
            .find(|c| c.name() == cookies::ACCESS_TOKEN)
            .unwrap();
        assert_eq!(
            access.max_age(),
            Some(tower_sessions::cookie::time::Duration::seconds(3600))
        );
        assert_eq!(
            set_cookie_names(&session.cookies),
            [
                cookies::ACCESS_TOKEN,
                cookies::EXPIRES_AT,
                cookies::REFRESH_TOKEN,
                cookies::ID_TOKEN
            ]
        );
        // Login cookies are deleted.
        assert_eq!(
            session
                .cookies
                .iter()
                .filter(|c| c.value().is_empty())
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn test_expired_login_cookie_rejected() {
        let manager = manager("https://shopify.com/1234");
        let params = CallbackParams {
            code: Some("code".into()),
            state: Some("st".into()),
        };
        let later = NOW_MS + (cookies::LOGIN_COOKIE_TTL_SECS + 5) * 1_000;
        let result = manager
            .complete_login(&params, &login_cookies(&manager, "st", "n"), later)
            .await;
        assert!(matches!(result, Err(AuthError::InvalidPkceCookie(_))));
    }

    #[tokio::test]
    async fn test_missing_code() {
        let manager = manager("https://shopify.com/1234");
        let result = manager
            .complete_login(&CallbackParams::default(), &HashMap::new(), NOW_MS)
            .await;
        assert!(matches!(result, Err(AuthError::MissingParameter("code"))));
    }

    #[tokio::test]
    async fn test_refresh_keeps_old_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/oauth/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "oauth-access-2",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/oauth/token"))
            .and(body_string_contains("subject_token=oauth-access-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "customer-access-2",
                "expires_in": 7200
            })))
            .mount(&server)
            .await;

        let manager = manager(&server.uri());
        let session = SessionCookies {
            refresh_token: Some("refresh-1".into()),
            expires_at: Some(NOW_MS - 1),
            ..SessionCookies::default()
        };
        let refreshed = manager.refresh(&session, NOW_MS).await.unwrap();
        assert_eq!(refreshed.access_token, "customer-access-2");
        let refresh = refreshed
            .cookies
            .iter()
            .find(|c| c.name() == cookies::REFRESH_TOKEN)
            .unwrap();
        assert_eq!(refresh.value(), "refresh-1");
        let expires = refreshed
            .cookies
            .iter()
            .find(|c| c.name() == cookies::EXPIRES_AT)
            .unwrap();
        assert_eq!(expires.value(), (NOW_MS + 3_480_000).to_string());
    }

    #[tokio::test]
    async fn test_refresh_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let manager = manager(&server.uri());
        let session = SessionCookies {
            refresh_token: Some("revoked".into()),
            ..SessionCookies::default()
        };
        assert!(matches!(
            manager.refresh(&session, NOW_MS).await,
            Err(AuthError::TokenEndpoint(_))
        ));
        assert!(matches!(
            manager.refresh(&SessionCookies::default(), NOW_MS).await,
            Err(AuthError::MissingRefreshToken)
        ));
    }

    #[test]
    fn test_logout() {
        let manager = manager("https://shopify.com/1234");
        let anonymous = manager.logout(&SessionCookies::default());
        assert_eq!(anonymous.url, "https://shop.example");
        assert_eq!(anonymous.cookies.len(), 7);

        let with_id = manager.logout(&SessionCookies {
            id_token: Some("idt".into()),
            ..SessionCookies::default()
        });
        assert!(with_id
            .url
            .starts_with("https://shopify.com/1234/auth/logout?id_token_hint=idt"));
    }
}
