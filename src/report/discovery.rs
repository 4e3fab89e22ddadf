//! Report discovery: walk a year-indexed listing page to the PDF behind each
//! matching record page.
//!
//! The link heuristics depend on the upstream page structure, so they sit behind
//! [`ReportDiscovery`] and can be swapped without touching the rest of the pipeline.

use crate::client::get_text;
use crate::client::providers::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Strategy for locating report documents
#[async_trait]
pub trait ReportDiscovery: Send + Sync {
    /// Return at most `limit` absolute document URLs for `year`
    async fn discover(
        &self,
        year: &str,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<Url>, ProviderError>;
}

/// EPrints repository discovery (`view/year/<year>.html` listings)
pub struct EprintsDiscovery {
    client: Client,
    base_url: Url,
    link_filter: String,
}

impl EprintsDiscovery {
    pub fn new(
        client: Client,
        base_url: &str,
        link_filter: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProviderError::Other(format!("Invalid base URL: {e}")))?;
        Ok(Self {
            client,
            base_url,
            link_filter: link_filter.into(),
        })
    }

    fn listing_url(&self, year: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(&format!("view/year/{year}.html"))
            .map_err(|e| ProviderError::InvalidInput(format!("Invalid year '{year}': {e}")))
    }
}

#[async_trait]
impl ReportDiscovery for EprintsDiscovery {
    async fn discover(
        &self,
        year: &str,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<Url>, ProviderError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let listing_url = self.listing_url(year)?;
        info!("Scanning report listing {}", listing_url);

        let listing = get_text(&self.client, listing_url.as_str(), timeout).await?;
        let record_pages = matching_links(&listing, &self.link_filter, &self.base_url);
        debug!("{} record pages match '{}'", record_pages.len(), self.link_filter);

        let mut documents = Vec::new();
        for record_url in record_pages {
            let page = get_text(&self.client, record_url.as_str(), timeout).await?;
            match first_pdf_link(&page, &self.base_url) {
                Some(pdf) => {
                    debug!("Record {} -> {}", record_url, pdf);
                    documents.push(pdf);
                }
                None => debug!("Record {} has no PDF link", record_url),
            }

            if documents.len() >= limit {
                break;
            }
        }

        info!("Discovered {} report documents for {}", documents.len(), year);
        Ok(documents)
    }
}

fn anchor_selector() -> Selector {
    Selector::parse("a[href]").expect("static selector is valid")
}

/// Absolute targets of anchors whose trimmed text contains `filter`
#[must_use]
pub fn matching_links(html: &str, filter: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = anchor_selector();

    document
        .select(&selector)
        .filter(|anchor| {
            let text = anchor.text().collect::<String>();
            text.trim().contains(filter)
        })
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .collect()
}

/// First anchor whose target ends in `.pdf`, resolved against `base`
#[must_use]
pub fn first_pdf_link(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = anchor_selector();

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .find(|href| href.ends_with(".pdf"))
        .and_then(|href| base.join(href).ok())
}
