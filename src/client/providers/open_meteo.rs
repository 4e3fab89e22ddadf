use super::parse_naive_utc;
use super::traits::{IngestContext, ProviderError, SourceProvider};
use crate::client::{get_json, Payload};
use crate::models::{IngestRecord, ObservationValue, StandardizedRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Hourly parameters requested when the payload names none
pub const DEFAULT_HOURLY: [&str; 2] = ["wave_height", "sea_surface_temperature"];

/// Open-Meteo marine forecast provider
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
}

impl OpenMeteoProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Zip each requested parameter's series against the shared time axis
    fn to_records(
        data: &Value,
        parameters: &[String],
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<StandardizedRecord>, ProviderError> {
        let hourly = data.get("hourly");
        let times: &[Value] = hourly
            .and_then(|h| h.get("time"))
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice);

        let mut records = Vec::new();
        for parameter in parameters {
            let values: &[Value] = hourly
                .and_then(|h| h.get(parameter))
                .and_then(Value::as_array)
                .map_or(&[], Vec::as_slice);

            for (time, raw) in times.iter().zip(values) {
                let Some(value) = ObservationValue::from_json(raw) else {
                    continue;
                };
                let time = time.as_str().ok_or_else(|| {
                    ProviderError::Parse(format!("non-string timestamp in series: {time}"))
                })?;

                records.push(StandardizedRecord {
                    latitude: Some(latitude),
                    longitude: Some(longitude),
                    station: None,
                    parameter: parameter.clone(),
                    value,
                    timestamp: parse_naive_utc(time)?,
                    source: "open-meteo".to_string(),
                });
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl SourceProvider for OpenMeteoProvider {
    fn name(&self) -> &str {
        "open-meteo"
    }

    fn description(&self) -> &str {
        "Open-Meteo marine API - hourly wave and sea surface forecasts"
    }

    async fn fetch(
        &self,
        payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError> {
        let latitude = payload.require_f64("latitude")?;
        let longitude = payload.require_f64("longitude")?;
        let parameters = payload
            .get_string_list("hourly")?
            .unwrap_or_else(|| DEFAULT_HOURLY.iter().map(ToString::to_string).collect());

        info!(
            "Fetching Open-Meteo marine data at ({}, {}) for {:?}",
            latitude, longitude, parameters
        );

        let query = vec![
            ("latitude".to_string(), latitude.to_string()),
            ("longitude".to_string(), longitude.to_string()),
            ("hourly".to_string(), parameters.join(",")),
        ];
        let data = get_json(&self.client, &self.base_url, &query, context.timeout).await?;

        let records = Self::to_records(&data, &parameters, latitude, longitude)?;
        debug!("Open-Meteo produced {} records", records.len());

        Ok(records.into_iter().map(IngestRecord::Observation).collect())
    }
}
