use crate::client::payload::Payload;
use crate::error::ErrorCategory;
use crate::models::IngestRecord;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Per-call context handed to a provider by the dispatcher
#[derive(Debug, Clone)]
pub struct IngestContext {
    /// Timeout applied to each external call
    pub timeout: Duration,
    /// Unique id of this ingestion batch, for log correlation
    pub batch_id: String,
    /// data.gov.in key, injected by the dispatcher
    pub api_key: Option<String>,
}

impl IngestContext {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            batch_id: uuid::Uuid::new_v4().to_string(),
            api_key: None,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

impl Default for IngestContext {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

/// Errors that can occur during provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Timeout occurred")]
    Timeout,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Resource exhausted: {resource} - {current}/{limit}")]
    ResourceExhausted {
        resource: String,
        current: u64,
        limit: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Map to the HTTP-facing category
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput(_) => ErrorCategory::Client,
            Self::NotFound(_) => ErrorCategory::NotFound,
            _ => ErrorCategory::Server,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Network(format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::Parse(format!("Failed to decode response: {e}"))
        } else {
            Self::Network(format!("Request failed: {e}"))
        }
    }
}

/// Trait for upstream data providers
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Registered name, as used in ingestion requests
    fn name(&self) -> &str;

    /// Human-readable description of the provider
    fn description(&self) -> &str;

    /// Fetch and normalize records for a caller payload.
    ///
    /// Either the full list is returned or an error; partial results are discarded.
    async fn fetch(
        &self,
        payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError>;
}
