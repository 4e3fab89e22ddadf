//! # Repository Pattern Implementation
//!
//! Storage abstraction for ingested records. The dispatcher only talks to the
//! [`RecordRepository`] trait, so the process-local store can be swapped for a
//! persistent backend without touching ingestion logic.
//!
//! ## Usage Example
//!
//! ```no_run
//! use marine_ingest::repositories::{InMemoryRecordRepository, RecordRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = InMemoryRecordRepository::new();
//! repository.append_batch(Vec::new()).await;
//! assert_eq!(repository.len().await, 0);
//! # Ok(())
//! # }
//! ```

pub mod record;

pub use record::{InMemoryRecordRepository, RecordRepository};

use async_trait::async_trait;
use std::fmt::Debug;

/// Base trait for all repositories providing common functionality
#[async_trait]
pub trait Repository: Send + Sync + Debug {
    /// Returns the name of the repository for logging and debugging
    fn name(&self) -> &'static str;

    /// Performs health check on the repository
    async fn health_check(&self) -> bool;

    /// Returns statistics about the repository
    async fn stats(&self) -> RepositoryStats;
}

/// Statistics about repository usage
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RepositoryStats {
    /// Total number of records stored
    pub total_entities: u64,
    /// Number of batches appended
    pub batches: u64,
}

impl RepositoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_batch(&mut self) {
        self.batches += 1;
    }
}
