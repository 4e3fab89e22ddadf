//! # Report Pipeline
//!
//! Discovery → retrieval → extraction → segmentation chain for PDF technical
//! reports. Each stage lives in its own module; [`ReportPipeline`] wires them
//! together and builds one [`ReportRecord`] per discovered document.

pub mod discovery;
pub mod download;
pub mod extract;
pub mod sections;

pub use discovery::{EprintsDiscovery, ReportDiscovery};
pub use download::{download_report, ReportArtifact};
pub use extract::{LopdfExtractor, ReportExtractor};
pub use sections::split_sections;

use crate::client::providers::ProviderError;
use crate::models::{ReportMetadata, ReportRecord, TableRows};
use chrono::Utc;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Provider tag carried on every report record
pub const REPORT_PROVIDER_TAG: &str = "cmfri_pdf";

pub struct ReportPipeline {
    client: Client,
    discovery: Arc<dyn ReportDiscovery>,
    extractor: Arc<dyn ReportExtractor>,
    download_dir: PathBuf,
}

impl ReportPipeline {
    pub fn new(
        client: Client,
        discovery: Arc<dyn ReportDiscovery>,
        extractor: Arc<dyn ReportExtractor>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            discovery,
            extractor,
            download_dir: download_dir.into(),
        }
    }

    /// Run every stage for up to `limit` reports of `year`
    pub async fn run(
        &self,
        year: &str,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<ReportRecord>, ProviderError> {
        let documents = self.discovery.discover(year, limit, timeout).await?;

        let mut records = Vec::with_capacity(documents.len());
        for url in &documents {
            let artifact = download_report(&self.client, url, &self.download_dir, timeout).await?;
            records.push(self.process(year, artifact).await?);
        }

        info!("Report pipeline produced {} records for {}", records.len(), year);
        Ok(records)
    }

    /// Extract and segment one downloaded document
    pub async fn process(
        &self,
        year: &str,
        artifact: ReportArtifact,
    ) -> Result<ReportRecord, ProviderError> {
        let (text, tables) = self.extract(&artifact).await?;
        let sections = split_sections(&text);

        Ok(ReportRecord {
            provider: REPORT_PROVIDER_TAG.to_string(),
            year: year.to_string(),
            report_name: artifact.file_name(),
            source_url: artifact.url.clone(),
            metadata: ReportMetadata {
                pages: extract::estimate_pages(&text),
                length_chars: text.chars().count(),
                size_bytes: artifact.size_bytes,
                sha256: artifact.sha256,
            },
            sections,
            tables,
            retrieved_at: Utc::now(),
            source: format!("cmfri/{year}"),
        })
    }

    /// PDF parsing is blocking work, so it runs off the async executor
    async fn extract(
        &self,
        artifact: &ReportArtifact,
    ) -> Result<(String, Vec<TableRows>), ProviderError> {
        let extractor = Arc::clone(&self.extractor);
        let path = artifact.path.clone();

        tokio::task::spawn_blocking(move || {
            let pages = extractor.extract_pages(&path)?;
            let text = extract::join_pages(&pages);
            let tables = match extractor.extract_tables(&pages) {
                Ok(tables) => tables,
                Err(e) => {
                    warn!("Table extraction failed for {}: {}", path.display(), e);
                    extract::extraction_error_tables(&e)
                }
            };
            Ok((text, tables))
        })
        .await
        .map_err(|e| ProviderError::Other(format!("Extraction task failed: {e}")))?
    }
}
