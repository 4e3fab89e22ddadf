//! Layered configuration: built-in defaults, an optional TOML file, then
//! `MARINE_INGEST__*` environment overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "marine-ingest.toml";

/// Environment prefix for overrides, e.g. `MARINE_INGEST__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "MARINE_INGEST";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub graceful_shutdown_timeout_secs: u64,
}

/// Upstream endpoints and per-call limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Fixed timeout applied to every external call
    pub timeout_secs: u64,
    /// Timeout for the best-effort NOAA station metadata lookup
    pub metadata_timeout_secs: u64,
    pub user_agent: String,
    pub open_meteo_url: String,
    pub noaa_url: String,
    pub noaa_metadata_url: String,
    pub obis_url: String,
    pub worms_url: String,
    pub bold_url: String,
    pub fisheries_url: String,
    /// Hard ceiling on data.gov.in pages fetched per ingestion
    pub fisheries_max_pages: u32,
    pub ftp_staging_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    pub eprints_url: String,
    pub link_filter: String,
    /// Folder downloaded report PDFs are written to
    pub download_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            graceful_shutdown_timeout_secs: 5,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            metadata_timeout_secs: 10,
            user_agent: format!("marine-ingest/{}", env!("CARGO_PKG_VERSION")),
            open_meteo_url: "https://marine-api.open-meteo.com/v1/marine".to_string(),
            noaa_url: "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter".to_string(),
            noaa_metadata_url: "https://api.tidesandcurrents.noaa.gov/mdapi/prod/webapi/stations"
                .to_string(),
            obis_url: "https://api.obis.org/v3".to_string(),
            worms_url: "https://www.marinespecies.org/rest".to_string(),
            bold_url: "http://www.boldsystems.org/index.php/API_Public".to_string(),
            fisheries_url:
                "https://api.data.gov.in/resource/a66f8149-d060-43f9-bc94-e9daeb2c0188".to_string(),
            fisheries_max_pages: 500,
            ftp_staging_dir: PathBuf::from("ftp_staging"),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            eprints_url: "https://eprints.cmfri.org.in/".to_string(),
            link_filter: "Marine Fish Landings".to_string(),
            download_dir: PathBuf::from("cmfri_reports"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            reports: ReportsConfig::default(),
        }
    }
}

/// Command-line overrides applied on top of the layered configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub download_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        builder = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                builder.add_source(config::File::from(path).required(true))
            }
            None => {
                builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
            }
        };

        let env = config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);

        let loaded: Self = builder
            .add_source(env)
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        debug!("Configuration loaded: {:?}", loaded);
        Ok(loaded)
    }

    /// Apply command-line overrides and re-validate
    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(host) = &overrides.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(dir) = &overrides.download_dir {
            self.reports.download_dir.clone_from(dir);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "port must be non-zero"));
        }
        if self.server.host.trim().is_empty() {
            return Err(invalid("server.host", "host cannot be empty"));
        }
        if self.providers.timeout_secs == 0 || self.providers.metadata_timeout_secs == 0 {
            return Err(invalid("providers.timeout_secs", "timeouts must be non-zero"));
        }
        if self.providers.fisheries_max_pages == 0 {
            return Err(invalid(
                "providers.fisheries_max_pages",
                "page ceiling must be at least 1",
            ));
        }

        let urls = [
            ("providers.open_meteo_url", &self.providers.open_meteo_url),
            ("providers.noaa_url", &self.providers.noaa_url),
            ("providers.noaa_metadata_url", &self.providers.noaa_metadata_url),
            ("providers.obis_url", &self.providers.obis_url),
            ("providers.worms_url", &self.providers.worms_url),
            ("providers.bold_url", &self.providers.bold_url),
            ("providers.fisheries_url", &self.providers.fisheries_url),
            ("reports.eprints_url", &self.reports.eprints_url),
        ];
        for (field, value) in urls {
            url::Url::parse(value)
                .map_err(|e| invalid(field, &format!("invalid URL '{value}': {e}")))?;
        }

        if self.reports.link_filter.trim().is_empty() {
            return Err(invalid("reports.link_filter", "link filter cannot be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::InvalidInput {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Secrets read from the process environment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    /// data.gov.in key, `DATA_GOV_API_KEY`
    pub data_gov_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Ok(envy::from_env::<Self>()?)
    }
}
