use crate::client::providers::ProviderError;
use thiserror::Error;

/// Crate-level error taxonomy
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Credential error: {0}")]
    Credentials(#[from] envy::Error),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors (usually permanent)
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    // Network errors outside of an adapter call
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Client errors (caller supplied something unusable)
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    // Adapter failures, classified by the provider error they carry
    #[error("Ingestion failed: {source}")]
    Ingestion {
        provider: String,
        #[source]
        source: ProviderError,
    },

    // General service error
    #[error("Service error: {0}")]
    Service(String),
}

/// Error categorization used for HTTP translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller supplied invalid or unsupported input
    Client,
    /// Upstream returned no matching data
    NotFound,
    /// Anything else: network, upstream schema surprise, internal failure
    Server,
}

impl ErrorCategory {
    /// HTTP status code for this category
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Client => 400,
            Self::NotFound => 404,
            Self::Server => 500,
        }
    }
}

impl Error {
    /// Categorize error for the HTTP surface
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidInput { .. } | Error::UnknownProvider(_) => ErrorCategory::Client,
            Error::Ingestion { source, .. } => source.category(),
            _ => ErrorCategory::Server,
        }
    }

    /// HTTP status code the server layer responds with
    pub fn status_code(&self) -> u16 {
        self.category().status_code()
    }

    /// Human-readable detail placed in the error response body
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
