use crate::error::ProviderError;
use crate::{restrict_to_range, ReturnSeriesProvider};
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{DateRange, ReturnSeries};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;

/// One stored observation. A `null` return marks a missing value.
#[derive(Debug, Deserialize)]
struct RawObservation {
    date: NaiveDate,
    #[serde(rename = "return")]
    value: Option<f64>,
}

/// Reads `<directory>/<ticker>.json`, a JSON array of
/// `{ "date": "YYYY-MM-DD", "return": 0.0012 }` objects.
#[derive(Debug, Clone)]
pub struct JsonDirectoryProvider {
    directory: PathBuf,
}

impl JsonDirectoryProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.directory.join(format!("{ticker}.json"))
    }
}

#[async_trait]
impl ReturnSeriesProvider for JsonDirectoryProvider {
    async fn fetch_returns(
        &self,
        ticker: &str,
        range: DateRange,
    ) -> Result<ReturnSeries, ProviderError> {
        let path = self.path_for(ticker);
        tracing::debug!(ticker, path = %path.display(), "Reading return series");

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProviderError::DataUnavailable {
                    ticker: ticker.to_string(),
                    start: range.start,
                    end: range.end,
                });
            }
            Err(source) => {
                return Err(ProviderError::Io {
                    ticker: ticker.to_string(),
                    source,
                });
            }
        };

        let raw: Vec<RawObservation> =
            serde_json::from_str(&text).map_err(|e| ProviderError::Deserialization {
                ticker: ticker.to_string(),
                message: e.to_string(),
            })?;

        let pairs = raw
            .into_iter()
            .map(|obs| (obs.date, obs.value.unwrap_or(f64::NAN)))
            .collect();
        let series = ReturnSeries::from_pairs(ticker, pairs)?;
        restrict_to_range(ticker, &series, range)
    }
}
