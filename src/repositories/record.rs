//! # Record Repository
//!
//! Append-only storage for normalized records. Nothing is ever removed for the
//! lifetime of the process; batches land whole and readers see insertion order.

use super::{Repository, RepositoryStats};
use crate::models::IngestRecord;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Record storage operations used by the dispatcher
#[async_trait]
pub trait RecordRepository: Repository {
    /// Append a batch atomically, returning the number of records added
    async fn append_batch(&self, records: Vec<IngestRecord>) -> usize;

    /// Snapshot of every stored record in insertion order
    async fn all(&self) -> Vec<IngestRecord>;

    /// Number of stored records
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Process-local store; contents are lost on restart
#[derive(Debug, Clone)]
pub struct InMemoryRecordRepository {
    records: Arc<RwLock<Vec<IngestRecord>>>,
    stats: Arc<RwLock<RepositoryStats>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(RepositoryStats::new())),
        }
    }
}

impl Default for InMemoryRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for InMemoryRecordRepository {
    fn name(&self) -> &'static str {
        "InMemoryRecordRepository"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn stats(&self) -> RepositoryStats {
        let records = self.records.read().await;
        let mut stats = self.stats.read().await.clone();
        stats.total_entities = records.len() as u64;
        stats
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn append_batch(&self, records: Vec<IngestRecord>) -> usize {
        let count = records.len();
        // Single write guard: concurrent readers never observe half a batch
        let total = {
            let mut stored = self.records.write().await;
            stored.extend(records);
            stored.len()
        };
        self.stats.write().await.record_batch();

        debug!("Appended {} records, store now holds {}", count, total);
        count
    }

    async fn all(&self) -> Vec<IngestRecord> {
        self.records.read().await.clone()
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
