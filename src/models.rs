//! # Record Model
//!
//! Every adapter converges on [`IngestRecord`], a tagged union with one variant per
//! provider family. Variants keep their own strongly-typed payloads; the
//! [`Provenance`] trait is the one contract shared by all of them.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Accessors every stored record guarantees
pub trait Provenance {
    /// Provenance tag, usually `"<provider>/<endpoint>"`
    fn source(&self) -> &str;

    /// Observation time, or ingestion time for records without one
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Value carried by a single observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationValue {
    Number(f64),
    Text(String),
    Null,
}

impl ObservationValue {
    /// Convert an upstream JSON value; `None` for JSON null
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            other => Some(Self::Text(other.to_string())),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Canonical observation shape shared by the weather and tide adapters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub station: Option<String>,
    /// Measured attribute name
    pub parameter: String,
    pub value: ObservationValue,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// Species occurrence (OBIS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub species: Option<String>,
    pub taxon_rank: Option<String>,
    pub family: Option<String>,
    pub order: Option<String>,
    pub class: Option<String>,
    pub basis_of_record: Option<String>,
    pub depth: Option<f64>,
    pub event_date: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// Taxonomic registry entry (WoRMS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonRecord {
    pub aphia_id: Option<i64>,
    pub scientific_name: Option<String>,
    pub rank: Option<String>,
    pub status: Option<String>,
    pub valid_name: Option<String>,
    pub valid_aphia_id: Option<i64>,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl TaxonRecord {
    /// Record wrapping a bare AphiaID response
    #[must_use]
    pub fn from_id(aphia_id: i64, source: String) -> Self {
        Self {
            aphia_id: Some(aphia_id),
            scientific_name: None,
            rank: None,
            status: None,
            valid_name: None,
            valid_aphia_id: None,
            kingdom: None,
            phylum: None,
            class: None,
            order: None,
            family: None,
            genus: None,
            timestamp: Utc::now(),
            source,
        }
    }
}

/// DNA barcode specimen (BOLD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeRecord {
    pub id: Option<String>,
    pub processid: Option<String>,
    pub species_name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub marker: Option<String>,
    pub genbank_accession: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// Yearly national fisheries production figures (data.gov.in)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FisheriesRecord {
    pub year: String,
    pub total_fish_production_lakh_tonnes: f64,
    pub marine_fish_production_lakh_tonnes: f64,
    pub inland_fish_production_lakh_tonnes: f64,
    pub total_exports_crores: f64,
    pub ingestion_timestamp: DateTime<Utc>,
    pub source: String,
}

/// Coarse document metadata for a processed report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Form-feed delimited page estimate
    pub pages: usize,
    pub length_chars: usize,
    pub size_bytes: u64,
    pub sha256: String,
}

/// One extracted table: a list of header -> cell rows, columns in header order
pub type TableRows = Vec<IndexMap<String, String>>;

/// Structured technical report (CMFRI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub provider: String,
    pub year: String,
    pub report_name: String,
    pub source_url: String,
    pub metadata: ReportMetadata,
    /// Section bodies keyed by heading, in document order
    pub sections: IndexMap<String, String>,
    pub tables: Vec<TableRows>,
    pub retrieved_at: DateTime<Utc>,
    pub source: String,
}

/// Arbitrary column -> value row from tabular sources (csv, ftp)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularRecord {
    pub row: IndexMap<String, String>,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// Any record the dispatcher can store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestRecord {
    Observation(StandardizedRecord),
    Occurrence(OccurrenceRecord),
    Taxon(TaxonRecord),
    Barcode(BarcodeRecord),
    Statistic(FisheriesRecord),
    Report(ReportRecord),
    Tabular(TabularRecord),
}

impl Provenance for StandardizedRecord {
    fn source(&self) -> &str {
        &self.source
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Provenance for OccurrenceRecord {
    fn source(&self) -> &str {
        &self.source
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Provenance for TaxonRecord {
    fn source(&self) -> &str {
        &self.source
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Provenance for BarcodeRecord {
    fn source(&self) -> &str {
        &self.source
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Provenance for FisheriesRecord {
    fn source(&self) -> &str {
        &self.source
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.ingestion_timestamp
    }
}

impl Provenance for ReportRecord {
    fn source(&self) -> &str {
        &self.source
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.retrieved_at
    }
}

impl Provenance for TabularRecord {
    fn source(&self) -> &str {
        &self.source
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl IngestRecord {
    fn as_provenance(&self) -> &dyn Provenance {
        match self {
            Self::Observation(r) => r,
            Self::Occurrence(r) => r,
            Self::Taxon(r) => r,
            Self::Barcode(r) => r,
            Self::Statistic(r) => r,
            Self::Report(r) => r,
            Self::Tabular(r) => r,
        }
    }

    /// Short name of the record family
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Observation(_) => "observation",
            Self::Occurrence(_) => "occurrence",
            Self::Taxon(_) => "taxon",
            Self::Barcode(_) => "barcode",
            Self::Statistic(_) => "statistic",
            Self::Report(_) => "report",
            Self::Tabular(_) => "tabular",
        }
    }
}

impl Provenance for IngestRecord {
    fn source(&self) -> &str {
        self.as_provenance().source()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.as_provenance().timestamp()
    }
}
