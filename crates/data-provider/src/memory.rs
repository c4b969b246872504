use crate::error::ProviderError;
use crate::{restrict_to_range, ReturnSeriesProvider};
use async_trait::async_trait;
use core_types::{DateRange, ReturnSeries};
use std::collections::HashMap;

/// A provider backed by series already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: HashMap<String, ReturnSeries>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `series` under its own name.
    pub fn with_series(mut self, series: ReturnSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn insert(&mut self, series: ReturnSeries) {
        self.series.insert(series.name().to_string(), series);
    }
}

#[async_trait]
impl ReturnSeriesProvider for InMemoryProvider {
    async fn fetch_returns(
        &self,
        ticker: &str,
        range: DateRange,
    ) -> Result<ReturnSeries, ProviderError> {
        let series = self
            .series
            .get(ticker)
            .ok_or_else(|| ProviderError::DataUnavailable {
                ticker: ticker.to_string(),
                start: range.start,
                end: range.end,
            })?;
        restrict_to_range(ticker, series, range)
    }
}
