//! Shopify Storefront and Customer Account API clients.
//!
//! # Architecture
//!
//! - Uses `graphql-client` request/response envelopes with hand-written
//!   operation documents (see [`storefront::queries`])
//! - Shopify is source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for product lookups (5 minute TTL)
//!
//! # APIs
//!
//! ## Storefront API
//! - Products (with reman metafields) and cart operations
//! - Storefront access token sent with every request
//!
//! ## Customer Account API
//! - OAuth 2.0 + PKCE token endpoint
//! - Customer profile and order history
//!
//! # Example
//!
//! ```rust,ignore
//! use reman_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.shopify);
//!
//! // Get a product
//! let product = client.get_product_by_handle("4l60e-transmission").await?;
//!
//! // Create a cart with the planned lines
//! let cart = client.create_cart(lines).await?;
//! ```

/// Implement `graphql_client::GraphQLQuery` for a hand-written document.
///
/// Expands to a unit struct whose variables and response types live in
/// `$module`, mirroring what the derive would generate.
macro_rules! operation {
    ($name:ident, $module:ident, $operation:literal, $document:expr) => {
        pub struct $name;

        impl ::graphql_client::GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(
                variables: Self::Variables,
            ) -> ::graphql_client::QueryBody<Self::Variables> {
                ::graphql_client::QueryBody {
                    variables,
                    query: $document,
                    operation_name: $operation,
                }
            }
        }
    };
}

pub mod customer;
pub mod storefront;
pub mod types;

pub use customer::{Customer, CustomerAccountClient, Order, TokenResponse};
pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors in {operation}: {}", format_graphql_errors(.errors))]
    GraphQL {
        /// Name of the failing operation.
        operation: String,
        errors: Vec<GraphQLError>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// Response data could not be mapped onto domain types.
    #[error("Invalid response data: {0}")]
    InvalidData(String),

    /// OAuth token endpoint or Customer Account API failure.
    #[error("OAuth error: {0}")]
    OAuth(String),
}

impl ShopifyError {
    /// Build a GraphQL error carrying a single message.
    pub(crate) fn graphql_message(operation: &str, message: impl Into<String>) -> Self {
        Self::GraphQL {
            operation: operation.to_string(),
            errors: vec![GraphQLError {
                message: message.into(),
                locations: vec![],
                path: vec![],
            }],
        }
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        Self {
            message: e.message,
            locations: e.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: e.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
