//! Authentication error types.

use thiserror::Error;

use crate::shopify::ShopifyError;

/// Errors that can occur during the customer login flow.
///
/// Every variant ends the flow it occurred in; no session cookies are
/// written once one of these is returned.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required callback parameter was absent.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// The callback `state` did not match the stored value.
    #[error("state mismatch")]
    StateMismatch,

    /// No PKCE verifier was stored for this login.
    #[error("missing code verifier")]
    MissingVerifier,

    /// A stored login cookie was forged, malformed or expired.
    #[error("invalid login cookie: {0}")]
    InvalidPkceCookie(&'static str),

    /// The ID token `nonce` claim did not match the stored value.
    #[error("nonce mismatch")]
    NonceMismatch,

    /// The ID token could not be decoded.
    #[error("malformed id token: {0}")]
    MalformedIdToken(String),

    /// The token endpoint rejected a grant.
    #[error("token endpoint failure: {0}")]
    TokenEndpoint(#[from] ShopifyError),

    /// Refresh was needed but no refresh token is stored.
    #[error("missing refresh token")]
    MissingRefreshToken,
}
