//! Delimited-text providers: CSV fetched over HTTP or passed inline, and CSV files
//! mirrored from FTP into a local staging directory.

use super::traits::{IngestContext, ProviderError, SourceProvider};
use crate::client::{get_text, Payload};
use crate::models::{IngestRecord, TabularRecord};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use reqwest::Client;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, instrument};

pub const DEFAULT_DELIMITER: char = ',';

/// Delimiter from the payload; must be a single ASCII character
fn delimiter(payload: &Payload) -> Result<u8, ProviderError> {
    let raw = payload.get_str_or("delimiter", &DEFAULT_DELIMITER.to_string())?;
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(ProviderError::InvalidInput(format!(
            "Delimiter must be a single ASCII character, got '{raw}'"
        ))),
    }
}

/// Parse delimited text with a header row into tabular records
pub fn parse_rows(
    content: &str,
    delimiter: u8,
    limit: Option<usize>,
    source: &str,
) -> Result<Vec<IngestRecord>, ProviderError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ProviderError::Parse(format!("Failed to read CSV header: {e}")))?
        .clone();

    let timestamp = Utc::now();
    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        if limit.is_some_and(|limit| records.len() >= limit) {
            break;
        }
        let row = row.map_err(|e| {
            ProviderError::Parse(format!("Malformed CSV row {}: {e}", index + 1))
        })?;

        let row: IndexMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.to_string(), cell.to_string()))
            .collect();

        records.push(IngestRecord::Tabular(TabularRecord {
            row,
            timestamp,
            source: source.to_string(),
        }));
    }

    debug!("Parsed {} rows from {}", records.len(), source);
    Ok(records)
}

/// CSV over HTTP, or inline `content`
pub struct CsvProvider {
    client: Client,
}

impl CsvProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn description(&self) -> &str {
        "Delimited text with a header row, fetched from a URL or passed inline"
    }

    #[instrument(skip(self, payload, context), fields(batch = %context.batch_id))]
    async fn fetch(
        &self,
        payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError> {
        let delimiter = delimiter(payload)?;
        let limit = payload.get_usize("limit")?;

        let (content, source) = if let Some(url) = payload.get_str("url")? {
            info!("Fetching CSV from {}", url);
            let content = get_text(&self.client, &url, context.timeout).await?;
            (content, format!("csv/{url}"))
        } else if let Some(content) = payload.get_str("content")? {
            (content, "csv/inline".to_string())
        } else {
            return Err(ProviderError::InvalidInput(
                "CSV requires either 'url' or 'content' in payload".to_string(),
            ));
        };

        parse_rows(&content, delimiter, limit, &source)
    }
}

/// CSV files synchronised from the FTP mirror into a staging directory
pub struct FtpProvider {
    staging_dir: PathBuf,
}

impl FtpProvider {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    /// Resolve a payload path, keeping it inside the staging directory
    fn resolve(&self, relative: &str) -> Result<PathBuf, ProviderError> {
        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(ProviderError::InvalidInput(format!(
                "Path '{relative}' must be relative to the FTP staging directory"
            )));
        }
        Ok(self.staging_dir.join(path))
    }
}

#[async_trait]
impl SourceProvider for FtpProvider {
    fn name(&self) -> &str {
        "ftp"
    }

    fn description(&self) -> &str {
        "CSV files mirrored from FTP into the local staging directory"
    }

    #[instrument(skip(self, payload, context), fields(batch = %context.batch_id))]
    async fn fetch(
        &self,
        payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError> {
        let relative = payload
            .get_str("path")?
            .ok_or_else(|| ProviderError::InvalidInput("Missing 'path' in payload".to_string()))?;
        let delimiter = delimiter(payload)?;
        let limit = payload.get_usize("limit")?;

        let path = self.resolve(&relative)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProviderError::NotFound(format!(
                    "No staged file at '{relative}'"
                )));
            }
            Err(e) => return Err(e.into()),
        };
        info!("Read {} bytes from {}", content.len(), path.display());

        parse_rows(&content, delimiter, limit, &format!("ftp/{relative}"))
    }
}
