use analytics::AnalyticsError;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// The statistics reported per ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    Wabp,
    AdditiveSortino,
    AdditiveReturnToMaxDrawdown,
    Sharpe,
    Sortino,
    MaxDrawdown,
    Return,
    Volatility,
    ReturnToMaxDrawdown,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Metric::Wabp => "WABP",
            Metric::AdditiveSortino => "+Sortino",
            Metric::AdditiveReturnToMaxDrawdown => "+Ret_To_MaxDD",
            Metric::Sharpe => "Sharpe",
            Metric::Sortino => "Sortino",
            Metric::MaxDrawdown => "Max_DD",
            Metric::Return => "Return",
            Metric::Volatility => "Vol",
            Metric::ReturnToMaxDrawdown => "Ret_To_MaxDD",
        };
        f.write_str(label)
    }
}

/// Direction of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A statistic that could not be computed for a row, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricFailure {
    pub metric: Metric,
    pub reason: String,
}

/// Collects row values, turning failed statistics into `None` plus a recorded
/// [`MetricFailure`].
#[derive(Debug)]
pub(crate) struct FailureLog<'a> {
    ticker: &'a str,
    failures: Vec<MetricFailure>,
}

impl<'a> FailureLog<'a> {
    pub(crate) fn new(ticker: &'a str) -> Self {
        Self {
            ticker,
            failures: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, metric: Metric, result: Result<f64, AnalyticsError>) -> Option<f64> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(ticker = self.ticker, %metric, error = %e, "Statistic is undefined");
                self.failures.push(MetricFailure {
                    metric,
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    pub(crate) fn into_failures(self) -> Vec<MetricFailure> {
        self.failures
    }
}

/// Statistics of the candidate's own returns plus its WABP scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReturnRow {
    pub ticker: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub wabp: Option<f64>,
    pub additive_sortino: Option<f64>,
    pub additive_return_to_max_drawdown: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub failures: Vec<MetricFailure>,
}

/// Statistics of the base portfolio after blending in the candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendedPortfolioRow {
    pub ticker: String,
    /// Annualized return in excess of the annual risk-free rate.
    pub annualized_return: Option<f64>,
    /// Annualized target downside deviation.
    pub downside_volatility: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub return_to_max_drawdown: Option<f64>,
    pub wabp: Option<f64>,
    pub failures: Vec<MetricFailure>,
}

/// Rows keyed by ticker, in the order the tickers were requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Table<R> {
    rows: Vec<R>,
}

pub type RiskReturnTable = Table<RiskReturnRow>;
pub type BlendedPortfolioTable = Table<BlendedPortfolioRow>;

pub trait Keyed {
    fn ticker(&self) -> &str;

    /// The row's value for `metric`; `None` when it is undefined or the row
    /// has no such column.
    fn metric(&self, metric: Metric) -> Option<f64>;
}

impl Keyed for RiskReturnRow {
    fn ticker(&self) -> &str {
        &self.ticker
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Wabp => self.wabp,
            Metric::AdditiveSortino => self.additive_sortino,
            Metric::AdditiveReturnToMaxDrawdown => self.additive_return_to_max_drawdown,
            Metric::Sharpe => self.sharpe,
            Metric::Sortino => self.sortino,
            Metric::MaxDrawdown => self.max_drawdown,
            Metric::Return | Metric::Volatility | Metric::ReturnToMaxDrawdown => None,
        }
    }
}

impl Keyed for BlendedPortfolioRow {
    fn ticker(&self) -> &str {
        &self.ticker
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Return => self.annualized_return,
            Metric::Volatility => self.downside_volatility,
            Metric::Sharpe => self.sharpe,
            Metric::Sortino => self.sortino,
            Metric::MaxDrawdown => self.max_drawdown,
            Metric::ReturnToMaxDrawdown => self.return_to_max_drawdown,
            Metric::Wabp => self.wabp,
            Metric::AdditiveSortino | Metric::AdditiveReturnToMaxDrawdown => None,
        }
    }
}

impl<R: Keyed> Table<R> {
    pub(crate) fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub(crate) fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    pub fn get(&self, ticker: &str) -> Option<&R> {
        self.rows.iter().find(|r| r.ticker() == ticker)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.iter()
    }

    /// The first `n` rows ordered by `metric`. Rows without a value go last;
    /// ties keep request order.
    pub fn ranked_by(&self, metric: Metric, order: SortOrder, n: usize) -> Vec<&R> {
        let mut ranked: Vec<&R> = self.rows.iter().collect();
        ranked.sort_by(|a, b| match (a.metric(metric), b.metric(metric)) {
            (Some(x), Some(y)) => match order {
                SortOrder::Ascending => x.total_cmp(&y),
                SortOrder::Descending => y.total_cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        ranked.truncate(n);
        ranked
    }
}
