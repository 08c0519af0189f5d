//! HTTP transport
//!
//! The engine only ever needs two calls: GET an absolute URL and POST a
//! pre-encoded form to one. Authentication lives here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use tw_core::TwilioConfig;

use crate::error::{Error, Result};

/// Status and raw body of one HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Authenticated request primitive used by every operation
///
/// Implementations return `Err` only when no response was obtained
/// (connection failure, unreadable body). Any HTTP status, success or
/// not, is a successful `RawResponse`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET an absolute URL
    async fn get(&self, url: &str) -> Result<RawResponse>;

    /// POST a `application/x-www-form-urlencoded` body to an absolute URL
    async fn post(&self, url: &str, form_body: String) -> Result<RawResponse>;
}

/// `reqwest`-backed transport using HTTP basic auth
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    account_sid: String,
    auth_token: String,
}

impl HttpTransport {
    /// Create a transport from the account config
    pub fn new(config: &TwilioConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    async fn read(response: reqwest::Response) -> Result<RawResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Self::read(response).await
    }

    async fn post(&self, url: &str, form_body: String) -> Result<RawResponse> {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header("Accept", "application/json")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(form_body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Self::read(response).await
    }
}
