use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No return data available for '{ticker}' between {start} and {end}")]
    DataUnavailable {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Failed to read return data for '{ticker}': {source}")]
    Io {
        ticker: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deserialize return data for '{ticker}': {message}")]
    Deserialization { ticker: String, message: String },

    #[error("Invalid data format from provider: {0}")]
    InvalidData(#[from] core_types::CoreError),
}
