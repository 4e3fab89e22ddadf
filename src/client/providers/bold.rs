use super::traits::{IngestContext, ProviderError, SourceProvider};
use crate::client::payload::{coerce_f64, to_query_pairs};
use crate::client::{get_json, Payload};
use crate::models::{BarcodeRecord, IngestRecord};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "specimen";
pub const DEFAULT_LIMIT: usize = 20;

/// BOLD Systems barcode provider
pub struct BoldProvider {
    client: Client,
    base_url: String,
}

impl BoldProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Flatten either response shape into a list of specimen objects.
    ///
    /// A mapping response is keyed by record id; the key is injected as `id`
    /// and non-object entries are dropped. Upstream key order is kept
    /// (serde_json `preserve_order`), so a later limit keeps the first specimens.
    fn specimens(data: Value) -> Vec<Value> {
        match data {
            Value::Object(map) => map
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::Object(mut record) => {
                        record.insert("id".to_string(), Value::String(key));
                        Some(Value::Object(record))
                    }
                    _ => None,
                })
                .collect(),
            Value::Array(items) => items,
            _ => Vec::new(),
        }
    }

    fn to_record(item: &Value, endpoint: &str) -> BarcodeRecord {
        let text = |key: &str| {
            item.get(key).and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        };

        BarcodeRecord {
            id: text("id"),
            processid: text("processid"),
            species_name: text("species_name"),
            lat: item.get("lat").and_then(coerce_f64),
            lon: item.get("lon").and_then(coerce_f64),
            marker: text("marker"),
            genbank_accession: text("genbank_accession"),
            timestamp: Utc::now(),
            source: format!("bold/{endpoint}"),
        }
    }
}

#[async_trait]
impl SourceProvider for BoldProvider {
    fn name(&self) -> &str {
        "bold"
    }

    fn description(&self) -> &str {
        "Barcode of Life Data System - specimen and DNA barcode records"
    }

    async fn fetch(
        &self,
        payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError> {
        let endpoint = payload.get_str_or("endpoint", DEFAULT_ENDPOINT)?;
        let mut params = payload.get_object("params")?.unwrap_or_default();

        // limit is applied client side and never forwarded
        let limit = Payload::from(params.clone()).get_usize_or("limit", DEFAULT_LIMIT)?;
        params.remove("limit");

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        info!("Fetching BOLD {} (limit {})", endpoint, limit);

        let data = get_json(&self.client, &url, &to_query_pairs(&params), context.timeout).await?;
        let specimens = Self::specimens(data);
        debug!("BOLD returned {} specimens before limit", specimens.len());

        Ok(specimens
            .iter()
            .take(limit)
            .map(|item| IngestRecord::Barcode(Self::to_record(item, &endpoint)))
            .collect())
    }
}
