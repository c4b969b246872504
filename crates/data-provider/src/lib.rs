use async_trait::async_trait;
use core_types::{DateRange, ReturnSeries};

pub mod error;
pub mod json_dir;
pub mod memory;

// --- Public API ---
pub use error::ProviderError;
pub use json_dir::JsonDirectoryProvider;
pub use memory::InMemoryProvider;

/// The abstract source of periodic return series.
///
/// The evaluator only talks to this trait, so the underlying implementation
/// (a local store, a market-data service, or a test fixture) can be swapped
/// out.
#[async_trait]
pub trait ReturnSeriesProvider: Send + Sync {
    /// Fetches the returns of `ticker` within `range`.
    ///
    /// Implementations return [`ProviderError::DataUnavailable`] when the
    /// ticker is unknown or has no observations in the range.
    async fn fetch_returns(
        &self,
        ticker: &str,
        range: DateRange,
    ) -> Result<ReturnSeries, ProviderError>;
}

/// Keeps the observations of `series` that fall inside `range`.
pub(crate) fn restrict_to_range(
    ticker: &str,
    series: &ReturnSeries,
    range: DateRange,
) -> Result<ReturnSeries, ProviderError> {
    let (dates, values): (Vec<_>, Vec<_>) = series
        .dates()
        .iter()
        .zip(series.values())
        .filter(|(date, _)| range.contains(**date))
        .map(|(date, value)| (*date, *value))
        .unzip();

    if dates.is_empty() {
        return Err(ProviderError::DataUnavailable {
            ticker: ticker.to_string(),
            start: range.start,
            end: range.end,
        });
    }
    Ok(ReturnSeries::new(ticker, dates, values)?)
}
