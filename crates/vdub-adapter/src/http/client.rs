/*
[INPUT]:  HTTP configuration (base URL, metadata and upload timeouts)
[OUTPUT]: Configured reqwest clients ready for API and storage calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::http::{Result, VdubError};

/// Default backend API prefix
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Timeout for metadata requests against the backend
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Timeout for the direct storage upload
    pub upload_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            upload_timeout: Duration::from_secs(600),
        }
    }
}

/// Main HTTP client for the dubbing backend
#[derive(Debug, Clone)]
pub struct VdubClient {
    http_client: Client,
    upload_client: Client,
    base_url: Url,
}

impl VdubClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| VdubError::Config(format!("build API client: {err}")))?;

        let upload_client = Client::builder()
            .timeout(config.upload_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| VdubError::Config(format!("build upload client: {err}")))?;

        Ok(Self {
            http_client,
            upload_client,
            base_url: normalize_base_url(&config.base_url)?,
        })
    }

    /// Create a client pointed at a custom base URL, keeping the other settings
    pub fn with_config_and_base_url(mut config: ClientConfig, base_url: &str) -> Result<Self> {
        config.base_url = base_url.to_string();
        Self::with_config(config)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL for an API endpoint, keeping the configured path prefix
    fn api_url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Build request builder for API endpoints
    pub(crate) fn api_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.api_url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Build request builder against an absolute storage URL on the long-timeout channel
    pub(crate) fn upload_request(&self, host: &str) -> Result<RequestBuilder> {
        let url = Url::parse(host)?;
        Ok(self.upload_client.post(url))
    }

    /// Send a request and decode a JSON body from a success response
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send_checked(builder).await?;
        let body = response.text().await.map_err(VdubError::from_transport)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request whose success response carries no body of interest
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send_checked(builder).await?;
        Ok(())
    }

    async fn send_checked(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(VdubError::from_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = VdubError::api_error(status, &body);
        tracing::debug!(status = status.as_u16(), error = %err, "backend returned error response");
        Err(err)
    }
}

/// Make sure the base URL ends with `/` so `join` appends instead of replacing
/// the last path segment.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(VdubError::Config("base URL must not be empty".to_string()));
    }
    let mut url = Url::parse(trimmed)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
