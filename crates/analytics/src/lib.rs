//! # Diversifier Analytics Engine
//!
//! Risk/return statistics for periodic return series, and the "win above base
//! portfolio" (WABP) score that measures how blending a candidate asset into a
//! base portfolio changes its risk-adjusted return.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O and no knowledge of where series come from. It
//!   depends only on `core-types`.
//! - **Explicit failure:** a statistic that would divide by zero, or a composite
//!   score with a negative radicand, is returned as an `AnalyticsError` instead
//!   of a silent `NaN` or infinity.
//!
//! ## Public API
//!
//! - `stats`: Sharpe, Sortino, target downside deviation, annualized return,
//!   drawdowns and the return-to-max-drawdown ratio.
//! - `PortfolioBlender`: financed, weight-normalized blend of candidate and base.
//! - `ScoreEngine`: WABP composite and additive sub-scores, blended return/risk.

pub mod blender;
pub mod error;
pub mod score;
pub mod stats;

pub use blender::PortfolioBlender;
pub use error::AnalyticsError;
pub use score::{composite_score, EvaluationParams, RiskProfile, ScoreEngine, WabpBreakdown};
