use super::traits::{IngestContext, ProviderError, SourceProvider};
use crate::client::payload::{coerce_f64, to_query_pairs};
use crate::client::{get_json, Payload};
use crate::models::{IngestRecord, OccurrenceRecord};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

pub const DEFAULT_ENDPOINT: &str = "occurrence";

/// OBIS species occurrence provider
pub struct ObisProvider {
    client: Client,
    base_url: String,
}

impl ObisProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Occurrence items live under `results`, or `data` on some endpoints
    fn items(data: &Value) -> &[Value] {
        data.get("results")
            .or_else(|| data.get("data"))
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    fn to_record(item: &Value, endpoint: &str) -> OccurrenceRecord {
        let text = |key: &str| item.get(key).and_then(Value::as_str).map(ToString::to_string);
        let number = |key: &str| item.get(key).and_then(coerce_f64);

        OccurrenceRecord {
            latitude: number("decimalLatitude"),
            longitude: number("decimalLongitude"),
            species: text("scientificName"),
            taxon_rank: text("taxonRank"),
            family: text("family"),
            order: text("order"),
            class: text("class"),
            basis_of_record: text("basisOfRecord"),
            depth: number("depth"),
            event_date: text("eventDate"),
            timestamp: Utc::now(),
            source: format!("obis/{endpoint}"),
        }
    }
}

#[async_trait]
impl SourceProvider for ObisProvider {
    fn name(&self) -> &str {
        "obis"
    }

    fn description(&self) -> &str {
        "Ocean Biodiversity Information System - species occurrence records"
    }

    async fn fetch(
        &self,
        payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError> {
        let endpoint = payload.get_str_or("endpoint", DEFAULT_ENDPOINT)?;
        let params = payload.get_object("params")?.unwrap_or_else(|| {
            json!({"size": 10})
                .as_object()
                .cloned()
                .unwrap_or_default()
        });

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        info!("Fetching OBIS {} with {} params", endpoint, params.len());

        let data = get_json(&self.client, &url, &to_query_pairs(&params), context.timeout).await?;

        Ok(Self::items(&data)
            .iter()
            .map(|item| IngestRecord::Occurrence(Self::to_record(item, &endpoint)))
            .collect())
    }
}
