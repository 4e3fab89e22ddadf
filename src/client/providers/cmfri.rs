use super::traits::{IngestContext, ProviderError, SourceProvider};
use crate::client::Payload;
use crate::models::IngestRecord;
use crate::report::ReportPipeline;
use async_trait::async_trait;
use tracing::{info, instrument};

pub const DEFAULT_YEAR: &str = "2023";
pub const DEFAULT_LIMIT: usize = 1;

/// CMFRI marine fish landings reports, harvested from the institute's eprints archive
pub struct CmfriProvider {
    pipeline: ReportPipeline,
}

impl CmfriProvider {
    pub fn new(pipeline: ReportPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl SourceProvider for CmfriProvider {
    fn name(&self) -> &str {
        "cmfri"
    }

    fn description(&self) -> &str {
        "CMFRI eprints - marine fish landings PDF reports, segmented into sections and tables"
    }

    #[instrument(skip(self, payload, context), fields(batch = %context.batch_id))]
    async fn fetch(
        &self,
        payload: &Payload,
        context: &IngestContext,
    ) -> Result<Vec<IngestRecord>, ProviderError> {
        let year = payload.get_str_or("year", DEFAULT_YEAR)?;
        let limit = payload.get_usize_or("limit", DEFAULT_LIMIT)?;
        info!("Harvesting up to {} CMFRI reports for {}", limit, year);

        let reports = self.pipeline.run(&year, limit, context.timeout).await?;
        Ok(reports.into_iter().map(IngestRecord::Report).collect())
    }
}
