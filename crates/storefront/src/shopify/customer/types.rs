//! Types for Shopify Customer Account API OAuth and responses.

use serde::{Deserialize, Serialize};

use reman_core::Price;

// ─────────────────────────────────────────────────────────────────────────────
// OAuth Types
// ─────────────────────────────────────────────────────────────────────────────

/// Raw token endpoint response.
///
/// The same shape covers the authorization-code, refresh-token and
/// token-exchange grants; only the first returns an ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// The ID token (`OpenID` Connect).
    #[serde(default)]
    pub id_token: Option<String>,
    /// The refresh token for obtaining new access tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Token endpoint body, which reports some failures with a 200 and an
/// `error` field.
#[derive(Debug, Deserialize)]
pub(super) struct TokenEndpointBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(flatten)]
    pub token: Option<TokenResponse>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Types
// ─────────────────────────────────────────────────────────────────────────────

/// The logged-in customer's profile.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    /// The customer's email address.
    pub email: Option<String>,
    /// The customer's first name.
    pub first_name: Option<String>,
    /// The customer's last name.
    pub last_name: Option<String>,
    /// Customer tags (used for wholesale pricing groups).
    pub tags: Vec<String>,
}

impl Customer {
    /// Get the customer's full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }
}

/// A customer order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// The order ID.
    pub id: String,
    /// The order name (e.g., "#1001").
    pub name: String,
    /// The order number.
    pub number: i64,
    /// When the order was processed (RFC 3339).
    pub processed_at: String,
    /// The financial status.
    pub financial_status: Option<String>,
    /// The fulfillment status.
    pub fulfillment_status: Option<String>,
    /// The total price.
    pub total_price: Price,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_token_body_with_error() {
        let body: TokenEndpointBody =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"expired"}"#)
                .unwrap();
        assert_eq!(body.error.as_deref(), Some("invalid_grant"));
        assert!(body.token.is_none());
    }

    #[test]
    fn test_token_body_success() {
        let body: TokenEndpointBody = serde_json::from_str(
            r#"{"access_token":"at","expires_in":7200,"refresh_token":"rt","token_type":"Bearer"}"#,
        )
        .unwrap();
        assert!(body.error.is_none());
        let token = body.token.unwrap();
        assert_eq!(token.expires_in, 7200);
        assert_eq!(token.refresh_token.as_deref(), Some("rt"));
        assert_eq!(token.id_token, None);
    }

    #[test]
    fn test_full_name() {
        let customer = Customer {
            email: None,
            first_name: Some("Dana".to_string()),
            last_name: None,
            tags: vec![],
        };
        assert_eq!(customer.full_name(), "Dana");
    }
}
