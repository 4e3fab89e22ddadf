pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod repositories;
pub mod server;

pub use client::{IngestDispatcher, IngestOutcome, Payload};
pub use config::{Config, ConfigOverrides, Credentials};
pub use error::{Error, ErrorCategory, Result};
pub use models::{IngestRecord, Provenance};
pub use repositories::{InMemoryRecordRepository, RecordRepository};
pub use server::Server;
