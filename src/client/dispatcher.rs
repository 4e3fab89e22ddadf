use super::providers::{
    BoldProvider, CmfriProvider, CsvProvider, FisheriesProvider, FtpProvider, IngestContext,
    NoaaProvider, ObisProvider, OpenMeteoProvider, SourceProvider, WormsProvider,
};
use super::{build_http_client, HttpClientConfig, Payload};
use crate::config::{Config, Credentials};
use crate::models::IngestRecord;
use crate::report::{EprintsDiscovery, LopdfExtractor, ReportPipeline};
use crate::repositories::RecordRepository;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Response body of a successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub status: String,
    pub records: Vec<IngestRecord>,
}

impl IngestOutcome {
    fn success(records: Vec<IngestRecord>) -> Self {
        Self {
            status: "success".to_string(),
            records,
        }
    }
}

/// Routes ingestion requests to the named provider and commits results to the store
pub struct IngestDispatcher {
    providers: HashMap<String, Arc<dyn SourceProvider>>,
    repository: Arc<dyn RecordRepository>,
    credentials: Credentials,
    timeout: Duration,
}

impl IngestDispatcher {
    /// Empty dispatcher; providers are added with [`IngestDispatcher::register`]
    pub fn new(
        repository: Arc<dyn RecordRepository>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Self {
        Self {
            providers: HashMap::new(),
            repository,
            credentials,
            timeout,
        }
    }

    /// Dispatcher with every built-in provider registered
    pub fn from_config(
        config: &Config,
        credentials: Credentials,
        repository: Arc<dyn RecordRepository>,
    ) -> Result<Self> {
        let providers = &config.providers;
        let client = build_http_client(&HttpClientConfig::from(providers))
            .map_err(|e| Error::Service(e.to_string()))?;

        let discovery = EprintsDiscovery::new(
            client.clone(),
            &config.reports.eprints_url,
            config.reports.link_filter.clone(),
        )
        .map_err(|e| Error::InvalidInput {
            field: "reports.eprints_url".to_string(),
            reason: e.to_string(),
        })?;
        let pipeline = ReportPipeline::new(
            client.clone(),
            Arc::new(discovery),
            Arc::new(LopdfExtractor),
            config.reports.download_dir.clone(),
        );

        let mut dispatcher = Self::new(
            repository,
            credentials,
            Duration::from_secs(providers.timeout_secs),
        );
        dispatcher.register(Arc::new(OpenMeteoProvider::new(
            client.clone(),
            &providers.open_meteo_url,
        )));
        dispatcher.register(Arc::new(NoaaProvider::new(
            client.clone(),
            &providers.noaa_url,
            &providers.noaa_metadata_url,
            Duration::from_secs(providers.metadata_timeout_secs),
        )));
        dispatcher.register(Arc::new(ObisProvider::new(client.clone(), &providers.obis_url)));
        dispatcher.register(Arc::new(WormsProvider::new(client.clone(), &providers.worms_url)));
        dispatcher.register(Arc::new(BoldProvider::new(client.clone(), &providers.bold_url)));
        dispatcher.register(Arc::new(FisheriesProvider::new(
            client.clone(),
            &providers.fisheries_url,
            providers.fisheries_max_pages,
        )));
        dispatcher.register(Arc::new(CsvProvider::new(client)));
        dispatcher.register(Arc::new(FtpProvider::new(providers.ftp_staging_dir.clone())));
        dispatcher.register(Arc::new(CmfriProvider::new(pipeline)));

        info!(
            "Initialized ingest dispatcher with {} providers",
            dispatcher.providers.len()
        );
        Ok(dispatcher)
    }

    /// Add a provider, replacing any registered under the same name
    pub fn register(&mut self, provider: Arc<dyn SourceProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Registered provider names, sorted
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Name and description of each registered provider, sorted by name
    pub fn describe(&self) -> Vec<(String, String)> {
        self.providers()
            .into_iter()
            .filter_map(|name| {
                let description = self.providers.get(&name)?.description().to_string();
                Some((name, description))
            })
            .collect()
    }

    pub fn repository(&self) -> &Arc<dyn RecordRepository> {
        &self.repository
    }

    /// Run one provider and append its records to the store.
    ///
    /// Nothing is stored unless the provider returns its whole list.
    pub async fn ingest(&self, provider_name: &str, payload: Payload) -> Result<IngestOutcome> {
        let provider = self
            .providers
            .get(provider_name)
            .ok_or_else(|| Error::UnknownProvider(provider_name.to_string()))?;

        let context = IngestContext::new(self.timeout)
            .with_api_key(self.credentials.data_gov_api_key.clone());
        let start_time = Instant::now();
        info!(
            "Starting ingestion from {} (batch {})",
            provider_name, context.batch_id
        );

        let records = provider.fetch(&payload, &context).await.map_err(|source| {
            error!(
                "Ingestion from {} failed after {:?} (batch {}): {}",
                provider_name,
                start_time.elapsed(),
                context.batch_id,
                source
            );
            Error::Ingestion {
                provider: provider_name.to_string(),
                source,
            }
        })?;

        self.repository.append_batch(records.clone()).await;
        info!(
            "Ingested {} records from {} in {:?} (batch {})",
            records.len(),
            provider_name,
            start_time.elapsed(),
            context.batch_id
        );

        Ok(IngestOutcome::success(records))
    }

    /// Every stored record, in insertion order
    pub async fn records(&self) -> Vec<IngestRecord> {
        self.repository.all().await
    }
}
