//! Shopify Customer Account API client.
//!
//! The Customer Account API provides access to customer authentication and
//! account data. Uses OAuth 2.0 with PKCE for authentication.
//!
//! # OAuth Flow
//!
//! 1. Generate authorization URL with `authorization_url()`
//! 2. Redirect customer to Shopify's login page
//! 3. Shopify redirects back with authorization code
//! 4. Exchange code for tokens with `exchange_code()`
//! 5. Exchange the access token for a customer API token with
//!    `exchange_customer_token()`
//! 6. Use the customer API token for customer-scoped GraphQL calls
//!
//! # Example
//!
//! ```rust,ignore
//! use reman_storefront::shopify::CustomerAccountClient;
//!
//! let client = CustomerAccountClient::new(&config.shopify);
//!
//! let auth_url = client.authorization_url(&redirect_uri, &state, &nonce, &challenge);
//!
//! // After the OAuth callback
//! let token = client.exchange_code(&code, &verifier, &redirect_uri, origin).await?;
//! let customer_token = client.exchange_customer_token(&token.access_token, origin).await?;
//! let customer = client.get_customer(&customer_token.access_token).await?;
//! ```

pub mod queries;
mod types;

pub use types::*;

use std::sync::Arc;

use graphql_client::{GraphQLQuery, Response};
use tracing::instrument;

use crate::config::ShopifyConfig;
use crate::shopify::ShopifyError;

use queries::{GetCustomer, GetOrders, get_customer, get_orders};

/// Audience of the customer API token obtained through token exchange.
pub const CUSTOMER_API_AUDIENCE: &str = "30243aa5-17c1-465a-8493-944bcc4e88aa";

/// Scope requested during token exchange.
pub const CUSTOMER_API_SCOPE: &str = "https://api.customers.com/auth/customer.graphql";

/// Scopes requested at login.
pub const LOGIN_SCOPE: &str = "openid email https://api.customers.com/auth/customer.graphql";

const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";

// ─────────────────────────────────────────────────────────────────────────────
// Customer Account Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Shopify Customer Account API.
///
/// Handles the OAuth token endpoint and customer-scoped GraphQL queries.
#[derive(Clone)]
pub struct CustomerAccountClient {
    inner: Arc<CustomerAccountClientInner>,
}

struct CustomerAccountClientInner {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    client_id: String,
}

impl CustomerAccountClient {
    /// Create a new Customer Account API client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        Self {
            inner: Arc::new(CustomerAccountClientInner {
                client: reqwest::Client::new(),
                base_url: config
                    .customer_api_url
                    .as_str()
                    .trim_end_matches('/')
                    .to_string(),
                api_version: config.api_version.clone(),
                client_id: config.customer_client_id.clone(),
            }),
        }
    }

    fn token_url(&self) -> String {
        format!("{}/auth/oauth/token", self.inner.base_url)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // OAuth Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate the authorization URL for customer login.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL to redirect to after authentication
    /// * `state` - Random value echoed back on the callback (CSRF protection)
    /// * `nonce` - Random value expected in the ID token
    /// * `code_challenge` - S256 PKCE challenge for the stored verifier
    #[must_use]
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        nonce: &str,
        code_challenge: &str,
    ) -> String {
        let mut url = format!("{}/auth/oauth/authorize", self.inner.base_url);
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.inner.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", LOGIN_SCOPE)
            .append_pair("state", state)
            .append_pair("nonce", nonce)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .finish();
        url.push('?');
        url.push_str(&query);
        url
    }

    /// Generate the provider logout URL.
    ///
    /// # Arguments
    ///
    /// * `id_token` - The ID token from the current session
    /// * `post_logout_redirect_uri` - Where to redirect after logout
    #[must_use]
    pub fn logout_url(&self, id_token: &str, post_logout_redirect_uri: &str) -> String {
        format!(
            "{}/auth/logout?id_token_hint={}&post_logout_redirect_uri={}",
            self.inner.base_url,
            urlencoding::encode(id_token),
            urlencoding::encode(post_logout_redirect_uri)
        )
    }

    /// Exchange an authorization code for access tokens.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if the token endpoint rejects the code.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
        origin: &str,
    ) -> Result<TokenResponse, ShopifyError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("code", code),
            ("code_verifier", code_verifier),
        ];
        self.token_request(&params, origin, "Token exchange").await
    }

    /// Exchange an access token for a Customer Account API token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if the token endpoint rejects the token.
    #[instrument(skip_all)]
    pub async fn exchange_customer_token(
        &self,
        access_token: &str,
        origin: &str,
    ) -> Result<TokenResponse, ShopifyError> {
        let params = [
            ("grant_type", TOKEN_EXCHANGE_GRANT),
            ("client_id", self.inner.client_id.as_str()),
            ("audience", CUSTOMER_API_AUDIENCE),
            ("subject_token", access_token),
            ("subject_token_type", ACCESS_TOKEN_TYPE),
            ("scopes", CUSTOMER_API_SCOPE),
        ];
        self.token_request(&params, origin, "Customer token exchange")
            .await
    }

    /// Refresh an access token using a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if the token refresh fails.
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        refresh_token: &str,
        origin: &str,
    ) -> Result<TokenResponse, ShopifyError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.inner.client_id.as_str()),
        ];
        self.token_request(&params, origin, "Token refresh").await
    }

    /// POST a grant to the token endpoint.
    async fn token_request(
        &self,
        params: &[(&str, &str)],
        origin: &str,
        step: &str,
    ) -> Result<TokenResponse, ShopifyError> {
        let response = self
            .inner
            .client
            .post(self.token_url())
            .header("User-Agent", "*")
            .header("Origin", origin)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                step,
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Token endpoint returned non-success status"
            );
            return Err(ShopifyError::OAuth(format!("{step} failed ({status})")));
        }

        let body: TokenEndpointBody = serde_json::from_str(&text)?;
        if let Some(error) = body.error {
            let description = body.error_description.unwrap_or_default();
            tracing::warn!(step, error = %error, description = %description, "Token endpoint error");
            return Err(ShopifyError::OAuth(format!("{step} failed: {error}")));
        }

        body.token
            .ok_or_else(|| ShopifyError::OAuth(format!("{step} failed: no access token")))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // GraphQL Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a GraphQL operation against the Customer Account API.
    async fn query<Q: GraphQLQuery>(
        &self,
        access_token: &str,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let url = format!(
            "{}/account/customer/api/{}/graphql",
            self.inner.base_url, self.inner.api_version
        );
        let request_body = Q::build_query(variables);
        let operation = request_body.operation_name;

        let response = self
            .inner
            .client
            .post(&url)
            .header("Authorization", access_token)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                operation,
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Customer Account API returned non-success status"
            );
            return Err(ShopifyError::graphql_message(
                operation,
                format!("HTTP {status}"),
            ));
        }

        let response: Response<Q::ResponseData> = serde_json::from_str(&text)?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::GraphQL {
                operation: operation.to_string(),
                errors: errors.into_iter().map(Into::into).collect(),
            });
        }

        response
            .data
            .ok_or_else(|| ShopifyError::graphql_message(operation, "No data in response"))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the current customer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_customer(&self, access_token: &str) -> Result<Customer, ShopifyError> {
        let data = self
            .query::<GetCustomer>(access_token, get_customer::Variables)
            .await?;
        let customer = data.customer;

        Ok(Customer {
            email: customer.email_address.and_then(|e| e.email_address),
            first_name: customer.first_name,
            last_name: customer.last_name,
            tags: customer.tags,
        })
    }

    /// Get the customer's most recent orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or an order total cannot be
    /// parsed.
    #[instrument(skip(self, access_token))]
    pub async fn get_orders(
        &self,
        access_token: &str,
        first: i64,
    ) -> Result<Vec<Order>, ShopifyError> {
        let data = self
            .query::<GetOrders>(access_token, get_orders::Variables { first })
            .await?;

        data.customer
            .orders
            .into_nodes()
            .map(|o| {
                let total_price =
                    reman_core::Price::parse(&o.total_price.amount, &o.total_price.currency_code)
                        .map_err(|e| ShopifyError::InvalidData(e.to_string()))?;
                Ok(Order {
                    id: o.id,
                    name: o.name,
                    number: o.number,
                    processed_at: o.processed_at,
                    financial_status: o.financial_status,
                    fulfillment_status: o.fulfillment_status,
                    total_price,
                })
            })
            .collect()
    }
}
