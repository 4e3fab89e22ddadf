use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use marine_ingest::{
    Config, ConfigOverrides, Credentials, InMemoryRecordRepository, IngestDispatcher, Payload,
    Server,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "marine-ingest")]
#[command(about = "Marine data ingestion and normalization service")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./marine-ingest.toml when present)
    #[arg(long, global = true, env = "MARINE_INGEST_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the ingestion HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Where downloaded reports are written
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },
    /// Run a single ingestion and print the records as JSON
    Ingest {
        #[arg(long)]
        provider: String,
        /// Provider payload as a JSON object
        #[arg(long, default_value = "{}")]
        payload: String,
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },
    /// List registered providers
    Providers,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn build_dispatcher(config: &Config) -> anyhow::Result<IngestDispatcher> {
    let credentials = Credentials::from_env().context("reading credentials")?;
    let repository = Arc::new(InMemoryRecordRepository::new());
    Ok(IngestDispatcher::from_config(config, credentials, repository)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            download_dir,
        } => {
            let config = config.apply_overrides(&ConfigOverrides {
                host,
                port,
                download_dir,
            })?;
            let dispatcher = build_dispatcher(&config)?;
            Server::new(config, dispatcher).run().await?;
        }
        Commands::Ingest {
            provider,
            payload,
            download_dir,
        } => {
            let config = config.apply_overrides(&ConfigOverrides {
                download_dir,
                ..ConfigOverrides::default()
            })?;
            let payload: serde_json::Value =
                serde_json::from_str(&payload).context("parsing --payload")?;
            let payload = Payload::from_value(payload)?;

            let dispatcher = build_dispatcher(&config)?;
            let outcome = dispatcher.ingest(&provider, payload).await?;
            info!("{} returned {} records", provider, outcome.records.len());
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Providers => {
            let dispatcher = build_dispatcher(&config)?;
            for (name, description) in dispatcher.describe() {
                println!("{name:<12} {description}");
            }
        }
    }

    Ok(())
}
