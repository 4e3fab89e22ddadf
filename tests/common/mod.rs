#![allow(dead_code)]

use marine_ingest::{Config, Credentials, InMemoryRecordRepository, IngestDispatcher};
use std::path::Path;
use std::sync::Arc;

/// Configuration with every upstream pointed at a mock server
pub fn mock_config(uri: &str, workdir: &Path) -> Config {
    let mut config = Config::default();
    config.providers.timeout_secs = 5;
    config.providers.metadata_timeout_secs = 2;
    config.providers.open_meteo_url = format!("{uri}/v1/marine");
    config.providers.noaa_url = format!("{uri}/api/prod/datagetter");
    config.providers.noaa_metadata_url = format!("{uri}/mdapi/stations");
    config.providers.obis_url = format!("{uri}/v3");
    config.providers.worms_url = format!("{uri}/rest");
    config.providers.bold_url = format!("{uri}/bold");
    config.providers.fisheries_url = format!("{uri}/resource/fisheries");
    config.providers.fisheries_max_pages = 10;
    config.providers.ftp_staging_dir = workdir.join("ftp_staging");
    config.reports.eprints_url = format!("{uri}/");
    config.reports.download_dir = workdir.join("cmfri_reports");
    config
}

pub fn dispatcher(config: &Config) -> IngestDispatcher {
    let credentials = Credentials {
        data_gov_api_key: Some("test-key".to_string()),
    };
    IngestDispatcher::from_config(config, credentials, Arc::new(InMemoryRecordRepository::new()))
        .expect("dispatcher builds from mock config")
}
