pub mod dispatcher;
pub mod payload;
pub mod providers;

pub use dispatcher::{IngestDispatcher, IngestOutcome};
pub use payload::Payload;

use crate::config::ProvidersConfig;
use providers::ProviderError;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, error};

/// HTTP client configuration for upstream providers
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout duration
    pub timeout: Duration,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 10,
            user_agent: format!("marine-ingest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&ProvidersConfig> for HttpClientConfig {
    fn from(config: &ProvidersConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: config.user_agent.clone(),
            ..Self::default()
        }
    }
}

/// Build the shared reqwest client used by every provider
pub fn build_http_client(config: &HttpClientConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .gzip(true)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {e}")))
}

/// Issue a single GET and fail on any non-success status
pub async fn get_checked(
    client: &Client,
    url: &str,
    query: &[(String, String)],
    timeout: Duration,
) -> Result<Response, ProviderError> {
    debug!("GET {} {:?}", url, query);

    let response = client
        .get(url)
        .query(query)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            ProviderError::from(e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Http {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

/// GET and decode the body as JSON
pub async fn get_json(
    client: &Client,
    url: &str,
    query: &[(String, String)],
    timeout: Duration,
) -> Result<serde_json::Value, ProviderError> {
    let response = get_checked(client, url, query, timeout).await?;
    let text = response
        .text()
        .await
        .map_err(|e| ProviderError::Network(format!("Failed to read response: {e}")))?;

    serde_json::from_str(&text).map_err(|e| {
        debug!("Unparseable response from {}: {}", url, text);
        ProviderError::Parse(format!("Failed to parse JSON: {e}"))
    })
}

/// GET and return the body as text
pub async fn get_text(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<String, ProviderError> {
    get_checked(client, url, &[], timeout)
        .await?
        .text()
        .await
        .map_err(|e| ProviderError::Network(format!("Failed to read response: {e}")))
}
