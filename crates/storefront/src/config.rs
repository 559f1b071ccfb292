//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE_DOMAIN` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `STORE_PREFIX` - Which storefront this deployment serves (e.g., reman-transmission)
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API access token
//! - `SHOPIFY_CUSTOMER_ACCOUNT_API_CLIENT_ID` - Customer Account API OAuth client ID
//! - `SHOPIFY_CUSTOMER_ACCOUNT_API_URL` - Customer Account API base URL (e.g., <https://shopify.com/12345>)
//! - `SHOPIFY_ORIGIN_URL` - Public origin of the storefront
//! - `STOREFRONT_SESSION_SECRET` - Signing secret for login cookies (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2024-10)
//! - `SITE_NAME` - Display name of the store
//! - `KV_REST_API_URL` / `KV_REST_API_TOKEN` - Key-value store (disabled when unset)
//! - `STOREFRONT_REDIRECTS_ENABLED` - Serve KV-backed redirects (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0 / 0.1)

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use reman_core::DeliveryRates;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// The storefront brand a deployment serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorePrefix {
    CarPartPlanet,
    RemanEngine,
    RemanTransmission,
    TransmissionLocator,
    EngineLocator,
}

impl StorePrefix {
    /// The `STORE_PREFIX` value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CarPartPlanet => "car-part-planet",
            Self::RemanEngine => "reman-engine",
            Self::RemanTransmission => "reman-transmission",
            Self::TransmissionLocator => "transmission-locator",
            Self::EngineLocator => "engine-locator",
        }
    }

    /// Short code prefixing this store's KV keys.
    #[must_use]
    pub const fn kv_code(&self) -> &'static str {
        match self {
            Self::CarPartPlanet => "cpp",
            Self::RemanEngine => "re",
            Self::RemanTransmission => "rt",
            Self::TransmissionLocator => "tl",
            Self::EngineLocator => "el",
        }
    }

    /// Whether this store keeps legacy URL redirects in KV.
    #[must_use]
    pub const fn has_redirects(&self) -> bool {
        matches!(
            self,
            Self::RemanEngine | Self::RemanTransmission | Self::CarPartPlanet
        )
    }

    /// Delivery surcharges for this store.
    #[must_use]
    pub fn delivery_rates(&self) -> DeliveryRates {
        match self {
            Self::RemanTransmission => DeliveryRates::new(Decimal::from(299), Decimal::from(398)),
            _ => DeliveryRates::new(Decimal::ZERO, Decimal::from(99)),
        }
    }
}

impl fmt::Display for StorePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorePrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car-part-planet" => Ok(Self::CarPartPlanet),
            "reman-engine" => Ok(Self::RemanEngine),
            "reman-transmission" => Ok(Self::RemanTransmission),
            "transmission-locator" => Ok(Self::TransmissionLocator),
            "engine-locator" => Ok(Self::EngineLocator),
            other => Err(format!("unknown store prefix '{other}'")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public origin of the storefront (OAuth redirects land here)
    pub origin: Url,
    /// Display name of the store
    pub site_name: String,
    /// Which store this deployment serves
    pub store_prefix: StorePrefix,
    /// Signing secret for the short-lived login cookies
    pub session_secret: SecretString,
    /// Shopify API configuration
    pub shopify: ShopifyConfig,
    /// Key-value store, when configured
    pub kv: Option<KvConfig>,
    /// Whether legacy URL redirects are served
    pub redirects_enabled: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify Storefront and Customer Account API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store_domain: String,
    /// Shopify API version (e.g., 2024-10)
    pub api_version: String,
    /// Storefront API access token
    pub storefront_access_token: SecretString,
    /// Customer Account API OAuth client ID
    pub customer_client_id: String,
    /// Customer Account API base URL
    pub customer_api_url: Url,
}

impl fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store_domain", &self.store_domain)
            .field("api_version", &self.api_version)
            .field("storefront_access_token", &"[REDACTED]")
            .field("customer_client_id", &self.customer_client_id)
            .field("customer_api_url", &self.customer_api_url.as_str())
            .finish()
    }
}

impl ShopifyConfig {
    /// Storefront GraphQL endpoint.
    ///
    /// The domain gets an `https://` scheme unless it already has one.
    #[must_use]
    pub fn storefront_endpoint(&self) -> String {
        let domain = self.store_domain.trim_end_matches('/');
        if domain.starts_with("https://") || domain.starts_with("http://") {
            format!("{domain}/api/{}/graphql.json", self.api_version)
        } else {
            format!("https://{domain}/api/{}/graphql.json", self.api_version)
        }
    }
}

/// Key-value store REST configuration.
#[derive(Clone)]
pub struct KvConfig {
    /// REST endpoint base URL
    pub url: String,
    /// Bearer token
    pub token: SecretString,
}

impl fmt::Debug for KvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let origin = get_required_url("SHOPIFY_ORIGIN_URL")?;
        let store_prefix = get_required_env("STORE_PREFIX")?
            .parse::<StorePrefix>()
            .map_err(|e| ConfigError::InvalidEnvVar("STORE_PREFIX".to_string(), e))?;
        let site_name = get_env_or_default("SITE_NAME", store_prefix.as_str());
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let shopify = ShopifyConfig::from_env()?;
        let kv = KvConfig::from_env();
        let redirects_enabled = get_bool_env("STOREFRONT_REDIRECTS_ENABLED")?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            host,
            port,
            origin,
            site_name,
            store_prefix,
            session_secret,
            shopify,
            kv,
            redirects_enabled,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Origin without a trailing slash, as used in redirect URIs.
    #[must_use]
    pub fn origin_str(&self) -> &str {
        self.origin.as_str().trim_end_matches('/')
    }

    /// Absolute URL for a path on this storefront.
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{path}", self.origin_str())
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let store_domain = get_required_env("SHOPIFY_STORE_DOMAIN")?;
        if store_domain.contains('[') || store_domain.contains(']') {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPIFY_STORE_DOMAIN".to_string(),
                "must not contain '[' or ']'".to_string(),
            ));
        }

        Ok(Self {
            store_domain,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2024-10"),
            storefront_access_token: get_required_secret("SHOPIFY_STOREFRONT_ACCESS_TOKEN")?,
            customer_client_id: get_required_env("SHOPIFY_CUSTOMER_ACCOUNT_API_CLIENT_ID")?,
            customer_api_url: get_required_url("SHOPIFY_CUSTOMER_ACCOUNT_API_URL")?,
        })
    }
}

impl KvConfig {
    fn from_env() -> Option<Self> {
        let url = get_optional_env("KV_REST_API_URL")?;
        let token = get_optional_env("KV_REST_API_TOKEN")?;
        Some(Self {
            url,
            token: SecretString::from(token),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get a required environment variable as an absolute URL.
fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let value = get_required_env(key)?;
    Url::parse(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a boolean flag; unset means false.
fn get_bool_env(key: &str) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(false), |value| parse_bool(key, &value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{value}'"),
        )),
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
