use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: {0}")]
    NotEnoughData(String),

    #[error("{statistic} is undefined: {reason}")]
    DegenerateStatistic {
        statistic: &'static str,
        reason: String,
    },

    #[error("Composite WABP score is undefined: negative radicand {radicand}")]
    InvalidComposite { radicand: f64 },

    #[error("Invalid configuration: {0}")]
    Configuration(#[from] CoreError),
}

impl AnalyticsError {
    pub(crate) fn degenerate(statistic: &'static str, reason: impl Into<String>) -> Self {
        Self::DegenerateStatistic {
            statistic,
            reason: reason.into(),
        }
    }
}
