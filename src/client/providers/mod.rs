pub mod bold;
pub mod cmfri;
pub mod fisheries;
pub mod noaa;
pub mod obis;
pub mod open_meteo;
pub mod tabular;
pub mod traits;
pub mod worms;

pub use bold::BoldProvider;
pub use cmfri::CmfriProvider;
pub use fisheries::FisheriesProvider;
pub use noaa::NoaaProvider;
pub use obis::ObisProvider;
pub use open_meteo::OpenMeteoProvider;
pub use tabular::{CsvProvider, FtpProvider};
pub use traits::{IngestContext, ProviderError, SourceProvider};
pub use worms::WormsProvider;

use chrono::{DateTime, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d",
];

/// Parse an upstream date-time literal, treating offset-less values as UTC.
///
/// Accepts `T` or space between date and time, with or without seconds.
pub fn parse_naive_utc(raw: &str) -> Result<DateTime<Utc>, ProviderError> {
    let trimmed = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.with_timezone(&Utc));
    }

    let normalized = trimmed.replacen(' ', "T", 1);
    for format in NAIVE_FORMATS {
        if format == "%Y-%m-%d" {
            if let Ok(date) = chrono::NaiveDate::parse_from_str(&normalized, format) {
                return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
            }
        } else if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(ProviderError::Parse(format!("Unrecognized timestamp: {raw}")))
}
