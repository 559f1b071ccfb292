//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` request/response envelopes with `reqwest` 0.13 for
//! HTTP. Caches products using `moka` (5-minute TTL).

mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use reman_core::{CartId, Product};

use crate::config::ShopifyConfig;
use crate::shopify::ShopifyError;
use crate::shopify::types::{Cart, CartLineInput, CartUserError};

use conversions::{convert_cart, convert_product, convert_user_errors};
use queries::{
    AddToCart, CreateCart, GetCart, GetProductByHandle, add_to_cart, create_cart, get_cart,
    get_product_by_handle,
};

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides access to products and cart operations. Products are cached for
/// 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<String, Arc<Product>>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.storefront_endpoint(),
                access_token: config.storefront_access_token.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL operation.
    ///
    /// Failures carry the operation name so the failing query is visible in
    /// logs and Sentry.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);
        let operation = request_body.operation_name;

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Storefront-Access-Token", &self.inner.access_token)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                operation,
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::graphql_message(
                operation,
                format!(
                    "HTTP {status}: {}",
                    response_text.chars().take(200).collect::<String>()
                ),
            ));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    operation,
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(operation, errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL {
                operation: operation.to_string(),
                errors: errors.into_iter().map(Into::into).collect(),
            });
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::graphql_message(operation, "No data in response")
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// Products tagged hidden are returned as-is; the detail page serves them.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Arc<Product>, ShopifyError> {
        let cache_key = format!("product:{handle}");

        if let Some(product) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let variables = get_product_by_handle::Variables {
            handle: handle.to_string(),
        };

        let data = self.execute::<GetProductByHandle>(variables).await?;

        let product_data = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        let product = Arc::new(convert_product(product_data)?);

        self.inner
            .cache
            .insert(cache_key, Arc::clone(&product))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a new cart with the given lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or Shopify reports user errors.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<CreateCart>(create_cart::Variables { lines })
            .await?;

        let payload = data
            .cart_create
            .ok_or_else(|| ShopifyError::graphql_message("createCart", "No cart returned"))?;

        check_user_errors(convert_user_errors(payload.user_errors))?;

        payload
            .cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::graphql_message("createCart", "No cart returned"))?
    }

    /// Add lines to an existing cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or Shopify reports user errors.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id, line_count = lines.len()))]
    pub async fn add_to_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = add_to_cart::Variables {
            cart_id: cart_id.to_string(),
            lines,
        };
        let data = self.execute::<AddToCart>(variables).await?;

        let payload = data
            .cart_lines_add
            .ok_or_else(|| ShopifyError::graphql_message("addToCart", "No cart returned"))?;

        check_user_errors(convert_user_errors(payload.user_errors))?;

        payload
            .cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::graphql_message("addToCart", "No cart returned"))?
    }

    /// Get a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the cart no longer exists.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: cart_id.to_string(),
        };
        let data = self.execute::<GetCart>(variables).await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))?
    }
}

fn check_user_errors(errors: Vec<CartUserError>) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
    Err(ShopifyError::UserError(messages.join("; ")))
}
