//! # Diversifier Batch Evaluator
//!
//! Runs the analytics engine across a universe of candidate tickers against a
//! single base portfolio. Each ticker is retrieved and scored independently, so
//! one ticker's failure never affects another's rows.

pub mod batch;
pub mod error;
pub mod plan;
pub mod rows;

pub use batch::{
    BatchEvaluator, BatchReport, CumulativeReturns, Ranking, TickerEvaluation, TickerFailure,
    SUMMARY_RANKINGS,
};
pub use error::EvaluatorError;
pub use plan::{BasePortfolioSpec, EvaluationPlan};
pub use rows::{
    BlendedPortfolioRow, BlendedPortfolioTable, Keyed, Metric, MetricFailure, RiskReturnRow,
    RiskReturnTable, SortOrder,
};
