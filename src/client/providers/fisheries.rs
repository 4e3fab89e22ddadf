use super::traits::{IngestContext, ProviderError, SourceProvider};
use crate::client::payload::coerce_f64;
use crate::client::{get_json, Payload};
use crate::models::{FisheriesRecord, IngestRecord};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Records requested per page
pub const PAGE_SIZE: u64 = 100;

/// data.gov.in national fisheries statistics provider
pub struct FisheriesProvider {
    client: Client,
    base_url: String,
    max_pages: u32,
}

impl FisheriesProvider {
    pub fn new(client: Client, base_url: impl Into<String>, max_pages: u32) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            max_pages,
        }
    }

    /// Coerce one upstream item; `None` drops it
    fn to_record(item: &Value) -> Option<FisheriesRecord> {
        let figure = |key: &str| match item.get(key) {
            None | Some(Value::Null) => Some(0.0),
            Some(value) => coerce_f64(value),
        };

        let year = match item.get("financial_year") {
            None | Some(Value::Null) => "N/A".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return None,
        };

        Some(FisheriesRecord {
            year,
            total_fish_production_lakh_tonnes: figure("total_fish_production_lakh_tonnes")?,
            marine_fish_production_lakh_tonnes: figure("marine_fish_production_lakh_tonnes")?,
            inland_fish_production_lakh_tonnes: figure("inland_fish_production_lakh_tonnes")?,
            total_exports_crores: figure("total_exports_crores")?,
            ingestion_timestamp: Utc::now(),
            source: "data.gov.in".to_string(),
        })
    }
}

#[async_trait]
impl SourceProvider for FisheriesProvider {
    fn name(&self) -> &str {
        "fisheries"
    }

    fn description(&self) -> &str {
        "data.gov.in - yearly national fish production and export statistics"
    }

    #[instrument(skip(self, _payload, context), fields(batch = %context.batch_id))]
    async fn fetch(
        &self,
        _payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError> {
        // Upstream rejects a missing key itself; that failure propagates like any other
        let api_key = context.api_key.as_deref().unwrap_or_default();
        if api_key.is_empty() {
            warn!("No data.gov.in API key injected, request will likely be rejected");
        }

        let mut records = Vec::new();
        let mut offset = 0u64;
        let mut pages = 0u32;

        // Only pages carrying records count toward the ceiling; the empty page
        // that ends pagination is always fetched.
        loop {
            let query = vec![
                ("api-key".to_string(), api_key.to_string()),
                ("format".to_string(), "json".to_string()),
                ("limit".to_string(), PAGE_SIZE.to_string()),
                ("offset".to_string(), offset.to_string()),
            ];
            let data = get_json(&self.client, &self.base_url, &query, context.timeout).await?;

            let items = match data.get("records").and_then(Value::as_array) {
                Some(items) if !items.is_empty() => items,
                _ => break,
            };

            if pages >= self.max_pages {
                warn!(
                    "data.gov.in still returning records after {} pages, giving up",
                    pages
                );
                return Err(ProviderError::ResourceExhausted {
                    resource: "fisheries pages".to_string(),
                    current: u64::from(pages) + 1,
                    limit: u64::from(self.max_pages),
                });
            }
            pages += 1;

            let before = records.len();
            records.extend(
                items
                    .iter()
                    .filter_map(Self::to_record)
                    .map(IngestRecord::Statistic),
            );
            debug!(
                "Page at offset {}: kept {} of {} items",
                offset,
                records.len() - before,
                items.len()
            );

            offset += PAGE_SIZE;
        }

        info!("data.gov.in produced {} records over {} pages", records.len(), pages);
        Ok(records)
    }
}
