use super::parse_naive_utc;
use super::traits::{IngestContext, ProviderError, SourceProvider};
use crate::client::payload::coerce_f64;
use crate::client::{get_json, Payload};
use crate::models::{IngestRecord, ObservationValue, StandardizedRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Products accepted by the CO-OPS data getter
pub const VALID_PRODUCTS: [&str; 16] = [
    "water_level",
    "water_temperature",
    "air_temperature",
    "wind",
    "air_pressure",
    "visibility",
    "humidity",
    "conductivity",
    "salinity",
    "currents",
    "predictions",
    "hourly_height",
    "high_low",
    "monthly_mean",
    "daily_max_min",
    "six_minute",
];

pub const DEFAULT_PRODUCT: &str = "water_temperature";

/// Date selectors forwarded only when present in the payload
const DATE_KEYS: [&str; 4] = ["date", "range", "begin_date", "end_date"];

/// NOAA Tides & Currents station provider
pub struct NoaaProvider {
    client: Client,
    base_url: String,
    metadata_url: String,
    metadata_timeout: Duration,
}

impl NoaaProvider {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        metadata_url: impl Into<String>,
        metadata_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            metadata_url: metadata_url.into(),
            metadata_timeout,
        }
    }

    /// Validate the payload and build the data getter query
    fn build_query(
        payload: &Payload,
    ) -> Result<(String, String, Vec<(String, String)>), ProviderError> {
        let station = payload
            .get_str("station")?
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::InvalidInput("Missing 'station' in payload".to_string())
            })?;

        let product = payload.get_str_or("product", DEFAULT_PRODUCT)?;
        if !VALID_PRODUCTS.contains(&product.as_str()) {
            return Err(ProviderError::InvalidInput(format!(
                "Unsupported NOAA product: {product}"
            )));
        }

        let mut query = vec![
            ("product".to_string(), product.clone()),
            ("station".to_string(), station.clone()),
            ("units".to_string(), "metric".to_string()),
            ("time_zone".to_string(), "gmt".to_string()),
            ("format".to_string(), "json".to_string()),
        ];
        for key in DATE_KEYS {
            if let Some(value) = payload.get_str(key)? {
                query.push((key.to_string(), value));
            }
        }

        Ok((station, product, query))
    }

    /// Station coordinates carried inline by the data response
    fn inline_coordinates(data: &Value) -> Option<(Option<f64>, Option<f64>)> {
        let meta = data.get("metadata")?.as_object()?;
        if meta.is_empty() {
            return None;
        }
        Some((
            meta.get("lat").and_then(coerce_f64),
            meta.get("lon").and_then(coerce_f64),
        ))
    }

    /// Best-effort station metadata lookup; any failure yields no coordinates
    async fn lookup_coordinates(&self, station: &str) -> (Option<f64>, Option<f64>) {
        let url = format!("{}/{}/metadata.json", self.metadata_url.trim_end_matches('/'), station);

        match get_json(&self.client, &url, &[], self.metadata_timeout).await {
            Ok(meta) => {
                let first = meta
                    .get("stations")
                    .and_then(Value::as_array)
                    .and_then(|stations| stations.first());
                (
                    first.and_then(|s| s.get("lat")).and_then(coerce_f64),
                    first.and_then(|s| s.get("lng")).and_then(coerce_f64),
                )
            }
            Err(e) => {
                debug!(
                    "NOAA metadata lookup for {} failed, continuing without coordinates: {}",
                    station, e
                );
                (None, None)
            }
        }
    }

    fn to_records(
        points: &[Value],
        station: &str,
        product: &str,
        (latitude, longitude): (Option<f64>, Option<f64>),
    ) -> Result<Vec<StandardizedRecord>, ProviderError> {
        points
            .iter()
            .map(|point| {
                let raw_time = point
                    .get("t")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ProviderError::Parse(format!("data point without 't': {point}"))
                    })?;
                let value = point
                    .get("v")
                    .and_then(coerce_f64)
                    .ok_or_else(|| {
                        ProviderError::Parse(format!("non-numeric 'v' in data point: {point}"))
                    })?;

                Ok(StandardizedRecord {
                    latitude,
                    longitude,
                    station: Some(station.to_string()),
                    parameter: product.to_string(),
                    value: ObservationValue::Number(value),
                    timestamp: parse_naive_utc(raw_time)?,
                    source: "NOAA".to_string(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl SourceProvider for NoaaProvider {
    fn name(&self) -> &str {
        "noaa"
    }

    fn description(&self) -> &str {
        "NOAA Tides & Currents - station water level, temperature and meteorology"
    }

    #[instrument(skip(self, payload, context), fields(batch = %context.batch_id))]
    async fn fetch(
        &self,
        payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError> {
        let (station, product, query) = Self::build_query(payload)?;
        info!("Fetching NOAA {} for station {}", product, station);

        let data = get_json(&self.client, &self.base_url, &query, context.timeout).await?;

        let points = data
            .get("data")
            .and_then(Value::as_array)
            .filter(|points| !points.is_empty())
            .ok_or_else(|| ProviderError::NotFound("No data found from NOAA".to_string()))?;

        let coordinates = match Self::inline_coordinates(&data) {
            Some(coordinates) => coordinates,
            None => self.lookup_coordinates(&station).await,
        };

        let records = Self::to_records(points, &station, &product, coordinates)?;
        debug!("NOAA produced {} records", records.len());
        Ok(records.into_iter().map(IngestRecord::Observation).collect())
    }
}
