//! Session and login cookies.
//!
//! Session credentials live in four long-lived cookies. The PKCE verifier,
//! `state` and `nonce` live in three short-lived cookies whose values are
//! HMAC-signed and time-boxed, so a login round trip can only be completed
//! with material this server issued in the last few minutes.

use std::collections::HashMap;
use std::fmt;

use axum::http::{HeaderMap, HeaderValue, header};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Cookie, SameSite};

use super::AuthError;

/// Customer API access token.
pub const ACCESS_TOKEN: &str = "shop_customer_token";
/// Refresh token.
pub const REFRESH_TOKEN: &str = "shop_refresh_token";
/// Expiry of the access token, in epoch milliseconds.
pub const EXPIRES_AT: &str = "shop_expires_at";
/// ID token, kept for the logout `id_token_hint`.
pub const ID_TOKEN: &str = "shop_id_token";
/// PKCE verifier.
pub const VERIFIER: &str = "shop_verifier";
/// OAuth `state`.
pub const STATE: &str = "shop_state";
/// OpenID `nonce`.
pub const NONCE: &str = "shop_nonce";

/// Every session cookie.
pub const SESSION_COOKIES: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, EXPIRES_AT, ID_TOKEN];
/// Every login cookie.
pub const LOGIN_COOKIES: [&str; 3] = [VERIFIER, STATE, NONCE];

/// Lifetime of the refresh token, expiry and ID token cookies (one week).
pub const SESSION_MAX_AGE_SECS: i64 = 604_800;

/// Lifetime of the login cookies.
pub const LOGIN_COOKIE_TTL_SECS: i64 = 600;

/// Build an httpOnly, Secure, SameSite=Lax cookie on `/`.
#[must_use]
pub fn build(name: &'static str, value: impl Into<String>, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name, value.into()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Build a cookie that deletes `name`.
#[must_use]
pub fn removal(name: &'static str) -> Cookie<'static> {
    build(name, "", 0)
}

/// Removals for every session and login cookie.
#[must_use]
pub fn clear_all() -> Vec<Cookie<'static>> {
    SESSION_COOKIES
        .into_iter()
        .chain(LOGIN_COOKIES)
        .map(removal)
        .collect()
}

/// Append `Set-Cookie` headers for each cookie.
pub fn append_set_cookies(headers: &mut HeaderMap, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            headers.append(header::SET_COOKIE, value);
        } else {
            tracing::warn!(cookie = cookie.name(), "Cookie value is not a valid header");
        }
    }
}

/// Parse every `Cookie` header into a name/value map.
///
/// Later duplicates of a name are ignored.
#[must_use]
pub fn read_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse(value).flatten() {
            cookies
                .entry(cookie.name().to_string())
                .or_insert_with(|| cookie.value().to_string());
        }
    }
    cookies
}

// =============================================================================
// Session Cookies
// =============================================================================

/// Session credentials read from the request cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Epoch milliseconds.
    pub expires_at: Option<i64>,
    pub id_token: Option<String>,
}

impl SessionCookies {
    /// Read the session cookies from request headers.
    ///
    /// Empty values count as absent; an unparseable expiry counts as absent.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = read_cookies(headers);
        let mut take = |name: &str| cookies.remove(name).filter(|v| !v.is_empty());

        Self {
            access_token: take(ACCESS_TOKEN),
            refresh_token: take(REFRESH_TOKEN),
            expires_at: take(EXPIRES_AT).and_then(|v| v.parse().ok()),
            id_token: take(ID_TOKEN),
        }
    }
}

// =============================================================================
// Signed Login Cookies
// =============================================================================

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies login cookie values.
///
/// Signed form: `{value}.{issued_at_secs}.{hex hmac}`, where the MAC covers
/// the cookie name, the value and the issue time.
#[derive(Clone)]
pub struct LoginCookieSigner {
    mac: HmacSha256,
    ttl_secs: i64,
}

impl fmt::Debug for LoginCookieSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCookieSigner")
            .field("key", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl LoginCookieSigner {
    /// Create a signer keyed by the session secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is rejected by the MAC.
    pub fn new(secret: &SecretString) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret.expose_secret().as_bytes())?,
            ttl_secs: LOGIN_COOKIE_TTL_SECS,
        })
    }

    fn tag(&self, name: &str, value: &str, issued_at: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(name.as_bytes());
        mac.update(b"\0");
        mac.update(value.as_bytes());
        mac.update(b"\0");
        mac.update(issued_at.to_string().as_bytes());
        mac
    }

    /// Sign `value` for cookie `name` at `now_secs`.
    #[must_use]
    pub fn sign(&self, name: &str, value: &str, now_secs: i64) -> String {
        let tag = self.tag(name, value, now_secs).finalize().into_bytes();
        format!("{value}.{now_secs}.{}", hex::encode(tag))
    }

    /// Signed login cookie ready to be set.
    #[must_use]
    pub fn cookie(&self, name: &'static str, value: &str, now_secs: i64) -> Cookie<'static> {
        build(name, self.sign(name, value, now_secs), self.ttl_secs)
    }

    /// Verify a signed value and return the original.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPkceCookie` when the value is malformed,
    /// carries a bad MAC or is older than the TTL.
    pub fn verify(&self, name: &'static str, signed: &str, now_secs: i64) -> Result<String, AuthError> {
        let mut parts = signed.rsplitn(3, '.');
        let (Some(sig), Some(issued_at), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidPkceCookie(name));
        };

        let issued_at: i64 = issued_at
            .parse()
            .map_err(|_| AuthError::InvalidPkceCookie(name))?;
        let sig = hex::decode(sig).map_err(|_| AuthError::InvalidPkceCookie(name))?;

        self.tag(name, value, issued_at)
            .verify_slice(&sig)
            .map_err(|_| AuthError::InvalidPkceCookie(name))?;

        let age = now_secs - issued_at;
        if !(0..=self.ttl_secs).contains(&age) {
            return Err(AuthError::InvalidPkceCookie(name));
        }

        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn signer() -> LoginCookieSigner {
        LoginCookieSigner::new(&SecretString::from("k3y-for-signing-login-cookies-0123456789")).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = signer();
        let signed = signer.sign(STATE, "abc-_123", 1_000);
        assert_eq!(signer.verify(STATE, &signed, 1_100).unwrap(), "abc-_123");
    }

    #[test]
    fn test_tampered_value_rejected() {
        let signer = signer();
        let signed = signer.sign(STATE, "abc", 1_000).replacen("abc", "abd", 1);
        assert!(matches!(
            signer.verify(STATE, &signed, 1_000),
            Err(AuthError::InvalidPkceCookie(STATE))
        ));
    }

    #[test]
    fn test_value_bound_to_cookie_name() {
        let signer = signer();
        let signed = signer.sign(STATE, "abc", 1_000);
        assert!(signer.verify(NONCE, &signed, 1_000).is_err());
    }

    #[test]
    fn test_expired_value_rejected() {
        let signer = signer();
        let signed = signer.sign(VERIFIER, "abc", 1_000);
        assert!(signer.verify(VERIFIER, &signed, 1_000 + LOGIN_COOKIE_TTL_SECS + 1).is_err());
        assert!(signer.verify(VERIFIER, "abc", 1_000).is_err());
    }

    #[test]
    fn test_session_cookies_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static(
                "shop_customer_token=at; shop_refresh_token=; shop_expires_at=1700000000000; other=1",
            ),
        );
        let session = SessionCookies::from_headers(&headers);
        assert_eq!(session.access_token.as_deref(), Some("at"));
        assert_eq!(session.refresh_token, None);
        assert_eq!(session.expires_at, Some(1_700_000_000_000));
        assert_eq!(session.id_token, None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = build(ACCESS_TOKEN, "at", 7200).to_string();
        assert!(cookie.starts_with("shop_customer_token=at"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(cookie.contains("Path=/"));
    }
}
