use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluatorError {
    #[error("Provider error: {0}")]
    Provider(#[from] data_provider::ProviderError),

    #[error("Timed out after {seconds}s while retrieving '{ticker}'")]
    Timeout { ticker: String, seconds: f64 },

    #[error("'{ticker}' has no observations on the base portfolio's dates")]
    NoOverlap { ticker: String },

    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] configuration::error::ConfigError),
}
