//! Key-value store client (Upstash-compatible REST API).
//!
//! Holds vehicle filter lists and legacy URL redirects. Values are written
//! by the merchandising tooling as JSON strings; a value that is not JSON is
//! returned as a plain string.
//!
//! Commands are POSTed as a JSON array (`["GET", key]`) so keys containing
//! `/` need no escaping.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use crate::config::KvConfig;

/// Errors that can occur when talking to the KV store.
#[derive(Debug, Error)]
pub enum KvError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Stored value has an unexpected shape.
    #[error("Parse error for key {key}: {message}")]
    Parse { key: String, message: String },

    /// Client could not be configured.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    result: serde_json::Value,
}

/// KV REST client.
#[derive(Clone)]
pub struct KvClient {
    client: reqwest::Client,
    base_url: String,
}

impl KvClient {
    /// Create a new KV client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &KvConfig) -> Result<Self, KvError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.token.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| KvError::Config(format!("Invalid token format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the raw `result` for a key; `None` when the key is absent.
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, KvError> {
        let command = ["GET", key];
        let response = self
            .client
            .post(&self.base_url)
            .json(&command)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(KvError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GetResponse = response.json().await?;
        Ok(match body.result {
            serde_json::Value::Null => None,
            value => Some(value),
        })
    }

    /// Get a JSON value.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the value does not match `T`.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, KvError> {
        let parse_error = |e: serde_json::Error| KvError::Parse {
            key: key.to_string(),
            message: e.to_string(),
        };

        match self.get_value(key).await? {
            None => Ok(None),
            Some(serde_json::Value::String(raw)) => {
                serde_json::from_str(&raw).map(Some).map_err(parse_error)
            }
            Some(value) => serde_json::from_value(value).map(Some).map_err(parse_error),
        }
    }

    /// Get a string value.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_string(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.get_value(key).await?.map(|value| match value {
            serde_json::Value::String(raw) => serde_json::from_str::<String>(&raw).unwrap_or(raw),
            other => other.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use secrecy::SecretString;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client(server: &MockServer) -> KvClient {
        KvClient::new(&KvConfig {
            url: server.uri(),
            token: SecretString::from("kv-token"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_string_plain_and_json_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!(["GET", "rt./old-page"])))
            .and(header("Authorization", "Bearer kv-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "result": "/product/4l60e" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!(["GET", "rt./quoted"])))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "result": "\"/product/quoted\"" })),
            )
            .mount(&server)
            .await;

        let kv = client(&server).await;
        assert_eq!(
            kv.get_string("rt./old-page").await.unwrap().as_deref(),
            Some("/product/4l60e")
        );
        assert_eq!(
            kv.get_string("rt./quoted").await.unwrap().as_deref(),
            Some("/product/quoted")
        );
    }

    #[tokio::test]
    async fn test_missing_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": null })),
            )
            .mount(&server)
            .await;

        let kv = client(&server).await;
        assert_eq!(kv.get_string("rt.makes").await.unwrap(), None);
        assert_eq!(kv.get_json::<Vec<String>>("rt.makes").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_json_and_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!(["GET", "rt.years"])))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "result": "[\"2001\",\"2002\"]" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!(["GET", "rt.makes"])))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let kv = client(&server).await;
        assert_eq!(
            kv.get_json::<Vec<String>>("rt.years").await.unwrap(),
            Some(vec!["2001".to_string(), "2002".to_string()])
        );
        assert!(matches!(
            kv.get_json::<Vec<String>>("rt.makes").await,
            Err(KvError::Api { status: 500, .. })
        ));
    }
}
