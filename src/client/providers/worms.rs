use super::traits::{IngestContext, ProviderError, SourceProvider};
use crate::client::payload::scalar_to_string;
use crate::client::{get_json, Payload};
use crate::models::{IngestRecord, TaxonRecord};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "AphiaRecordsByName";
pub const DEFAULT_LIMIT: usize = 100;

/// WoRMS taxonomic registry provider
pub struct WormsProvider {
    client: Client,
    base_url: String,
}

impl WormsProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `<base>/<endpoint>/<name or id>`; WoRMS takes its argument in the path
    fn build_url(
        &self,
        endpoint: &str,
        params: &serde_json::Map<String, Value>,
    ) -> Result<String, ProviderError> {
        let argument = params
            .get("scientificname")
            .filter(|v| !v.is_null())
            .or_else(|| params.get("AphiaID").filter(|v| !v.is_null()))
            .map(scalar_to_string)
            .ok_or_else(|| {
                ProviderError::InvalidInput(
                    "WoRMS requires either 'scientificname' or 'AphiaID' in params".to_string(),
                )
            })?;

        Ok(format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint,
            urlencoding::encode(&argument)
        ))
    }

    /// Normalize the three response shapes WoRMS returns
    fn to_records(
        data: Value,
        endpoint: &str,
        limit: usize,
    ) -> Result<Vec<TaxonRecord>, ProviderError> {
        let source = format!("worms/{endpoint}");

        let items = match data {
            Value::Number(n) => {
                let id = n
                    .as_i64()
                    .ok_or_else(|| ProviderError::Parse(format!("non-integer AphiaID: {n}")))?;
                return Ok(vec![TaxonRecord::from_id(id, source)]);
            }
            Value::Object(_) => vec![data],
            Value::Array(items) => items,
            other => {
                return Err(ProviderError::Parse(format!(
                    "unexpected WoRMS response shape: {other}"
                )))
            }
        };

        Ok(items
            .iter()
            .take(limit)
            .map(|item| Self::to_record(item, &source))
            .collect())
    }

    fn to_record(item: &Value, source: &str) -> TaxonRecord {
        let text = |key: &str| item.get(key).and_then(Value::as_str).map(ToString::to_string);
        let id = |key: &str| item.get(key).and_then(Value::as_i64);

        TaxonRecord {
            aphia_id: id("AphiaID"),
            scientific_name: text("scientificname"),
            rank: text("rank"),
            status: text("status"),
            valid_name: text("valid_name"),
            valid_aphia_id: id("valid_AphiaID"),
            kingdom: text("kingdom"),
            phylum: text("phylum"),
            class: text("class"),
            order: text("order"),
            family: text("family"),
            genus: text("genus"),
            timestamp: Utc::now(),
            source: source.to_string(),
        }
    }
}

#[async_trait]
impl SourceProvider for WormsProvider {
    fn name(&self) -> &str {
        "worms"
    }

    fn description(&self) -> &str {
        "World Register of Marine Species - taxonomic names and classification"
    }

    async fn fetch(
        &self,
        payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError> {
        let endpoint = payload.get_str_or("endpoint", DEFAULT_ENDPOINT)?;
        let params = payload.get_object("params")?.unwrap_or_default();
        let limit = payload.get_usize_or("limit", DEFAULT_LIMIT)?;

        let url = self.build_url(&endpoint, &params)?;
        info!("Fetching WoRMS {}", url);

        let data = get_json(&self.client, &url, &[], context.timeout).await?;
        let records = Self::to_records(data, &endpoint, limit)?;
        debug!("WoRMS produced {} records", records.len());

        Ok(records.into_iter().map(IngestRecord::Taxon).collect())
    }
}
