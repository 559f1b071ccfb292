//! ID token claim inspection.
//!
//! The payload is decoded WITHOUT verifying the signature and only the
//! `nonce` claim is read. Nothing here may be used to establish identity.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use super::AuthError;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    nonce: Option<String>,
}

/// Read the `nonce` claim from an ID token.
///
/// # Errors
///
/// Returns `AuthError::MalformedIdToken` if the token is not a three-part
/// JWT with a base64url JSON payload.
pub fn nonce_claim(id_token: &str) -> Result<Option<String>, AuthError> {
    let mut parts = id_token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AuthError::MalformedIdToken("expected three segments".into())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::MalformedIdToken(e.to_string()))?;
    let claims: Claims =
        serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedIdToken(e.to_string()))?;

    Ok(claims.nonce)
}

#[cfg(test)]
pub(crate) fn unsigned_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
