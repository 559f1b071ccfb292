//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{ConfigError, StorefrontConfig};
use crate::services::auth::{LoginCookieSigner, SessionManager};
use crate::services::kv::KvClient;
use crate::shopify::{CustomerAccountClient, StorefrontClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration and the upstream clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    customer: CustomerAccountClient,
    sessions: SessionManager,
    kv: Option<KvClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the session secret cannot key the login cookie
    /// signer or the KV client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ConfigError> {
        let storefront = StorefrontClient::new(&config.shopify);
        let customer = CustomerAccountClient::new(&config.shopify);

        let signer = LoginCookieSigner::new(&config.session_secret).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_SESSION_SECRET".to_string(), e.to_string())
        })?;
        let sessions = SessionManager::new(customer.clone(), signer, config.origin_str());

        let kv = config
            .kv
            .as_ref()
            .map(KvClient::new)
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("KV_REST_API_TOKEN".to_string(), e.to_string()))?;
        if kv.is_none() {
            tracing::info!("KV store not configured; filters and redirects disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                customer,
                sessions,
                kv,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the Shopify Customer Account API client.
    #[must_use]
    pub fn customer(&self) -> &CustomerAccountClient {
        &self.inner.customer
    }

    /// Get a reference to the customer login session manager.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// Get the KV client, if configured.
    #[must_use]
    pub fn kv(&self) -> Option<&KvClient> {
        self.inner.kv.as_ref()
    }
}
