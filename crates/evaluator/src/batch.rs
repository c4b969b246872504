use crate::error::EvaluatorError;
use crate::plan::BasePortfolioSpec;
use crate::rows::{
    BlendedPortfolioRow, BlendedPortfolioTable, FailureLog, Keyed, Metric, RiskReturnRow,
    RiskReturnTable, SortOrder, Table,
};
use analytics::{stats, EvaluationParams, RiskProfile, ScoreEngine};
use chrono::NaiveDate;
use core_types::{DateRange, ReturnSeries};
use data_provider::ReturnSeriesProvider;
use futures::stream::{self, StreamExt};
use indicatif::ProgressStyle;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use tracing_indicatif::span_ext::IndicatifSpanExt;
use uuid::Uuid;

/// A ticker that produced no rows, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub reason: String,
}

/// Both rows computed for one ticker, plus its blended return series.
#[derive(Debug, Clone)]
pub struct TickerEvaluation {
    pub risk_return: RiskReturnRow,
    pub blended: BlendedPortfolioRow,
    pub blended_series: ReturnSeries,
}

/// Growth of one unit through each blended portfolio and through the base.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeReturns {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<(String, Vec<f64>)>,
}

/// The summaries printed after a batch: best Sharpe, lowest blended
/// volatility, best WABP.
pub const SUMMARY_RANKINGS: [(Metric, SortOrder); 3] = [
    (Metric::Sharpe, SortOrder::Descending),
    (Metric::Volatility, SortOrder::Ascending),
    (Metric::Wabp, SortOrder::Descending),
];

/// Tickers ordered by one metric, with their values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub metric: Metric,
    pub order: SortOrder,
    pub entries: Vec<(String, Option<f64>)>,
}

/// The outcome of one batch: the two result tables and per-ticker failures.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub base_name: String,
    pub asset_weight_percent: u32,
    pub risk_return: RiskReturnTable,
    pub blended: BlendedPortfolioTable,
    pub failures: Vec<TickerFailure>,
    #[serde(skip)]
    pub blended_series: HashMap<String, ReturnSeries>,
    #[serde(skip)]
    pub base: ReturnSeries,
}

impl BatchReport {
    /// Column label of the blended table's WABP score, e.g. `WABP_20%_asset`.
    pub fn wabp_label(&self) -> String {
        format!("WABP_{}%_asset", self.asset_weight_percent)
    }

    /// The top `n` tickers by `metric`. Blended-only metrics (return,
    /// volatility, return to max drawdown) rank the blended table; everything
    /// else ranks the candidates' own statistics.
    pub fn ranked_by(&self, metric: Metric, order: SortOrder, n: usize) -> Ranking {
        fn rank<R: Keyed>(table: &Table<R>, metric: Metric, order: SortOrder, n: usize) -> Vec<(String, Option<f64>)> {
            table
                .ranked_by(metric, order, n)
                .into_iter()
                .map(|row| (row.ticker().to_string(), row.metric(metric)))
                .collect()
        }

        let entries = match metric {
            Metric::Return | Metric::Volatility | Metric::ReturnToMaxDrawdown => {
                rank(&self.blended, metric, order, n)
            }
            _ => rank(&self.risk_return, metric, order, n),
        };
        Ranking {
            metric,
            order,
            entries,
        }
    }

    pub fn summaries(&self, n: usize) -> Vec<Ranking> {
        SUMMARY_RANKINGS
            .iter()
            .map(|(metric, order)| self.ranked_by(*metric, *order, n))
            .collect()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.risk_return.iter().map(|row| row.ticker.as_str())
    }

    /// Cumulative growth of every successful blend, in table order, followed
    /// by the base portfolio under its own name.
    pub fn cumulative_returns(&self) -> CumulativeReturns {
        let mut columns: Vec<(String, Vec<f64>)> = self
            .succeeded()
            .filter_map(|ticker| {
                self.blended_series
                    .get(ticker)
                    .map(|series| (ticker.to_string(), stats::cumulative_growth(series.values())))
            })
            .collect();
        columns.push((
            self.base_name.clone(),
            stats::cumulative_growth(self.base.values()),
        ));
        CumulativeReturns {
            dates: self.base.dates().to_vec(),
            columns,
        }
    }
}

/// Scores a list of candidate tickers against one shared base portfolio.
pub struct BatchEvaluator {
    engine: ScoreEngine,
    provider: Arc<dyn ReturnSeriesProvider>,
    timeout: Option<Duration>,
    max_concurrency: usize,
    progress_style: Option<ProgressStyle>,
}

impl BatchEvaluator {
    pub fn new(params: EvaluationParams, provider: Arc<dyn ReturnSeriesProvider>) -> Self {
        Self {
            engine: ScoreEngine::new(params),
            provider,
            timeout: None,
            max_concurrency: 1,
            progress_style: None,
        }
    }

    /// Bounds every individual retrieval. Without it a retrieval may take as
    /// long as the provider does.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// How many retrievals may be in flight at once.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Style of the batch progress bar. The bar is drawn by a
    /// `tracing_indicatif::IndicatifLayer` when one is installed.
    pub fn with_progress_style(mut self, style: ProgressStyle) -> Self {
        self.progress_style = Some(style);
        self
    }

    async fn fetch(&self, ticker: &str, range: DateRange) -> Result<ReturnSeries, EvaluatorError> {
        let request = self.provider.fetch_returns(ticker, range);
        let series = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| EvaluatorError::Timeout {
                    ticker: ticker.to_string(),
                    seconds: limit.as_secs_f64(),
                })??,
            None => request.await?,
        };
        Ok(series)
    }

    /// Retrieves both legs of the base portfolio and combines them.
    pub async fn build_base_portfolio(
        &self,
        spec: &BasePortfolioSpec,
        range: DateRange,
    ) -> Result<ReturnSeries, EvaluatorError> {
        let (stock, bond) = futures::try_join!(
            self.fetch(&spec.stock_ticker, range),
            self.fetch(&spec.bond_ticker, range)
        )?;
        let base = stock.weighted_sum(spec.stock_weight, &bond, spec.bond_weight, &spec.name);

        tracing::info!(
            base = %spec.name,
            observations = base.observed_count(),
            start = ?base.start_date(),
            end = ?base.end_date(),
            "Base portfolio constructed"
        );
        Ok(base)
    }

    /// Computes both rows for an already retrieved candidate series.
    ///
    /// The candidate is reindexed onto the base portfolio's dates before
    /// blending; the raw-series statistics use the candidate as given.
    pub fn evaluate_series(
        &self,
        candidate: &ReturnSeries,
        base: &ReturnSeries,
        base_profile: &RiskProfile,
    ) -> Result<TickerEvaluation, EvaluatorError> {
        let ticker = candidate.name();
        let aligned = candidate.reindex(base);
        if aligned.observed_count() == 0 {
            return Err(EvaluatorError::NoOverlap {
                ticker: ticker.to_string(),
            });
        }

        let params = self.engine.params();
        let risk_free = params.rates.risk_free_annual;
        let periodicity = params.periodicity;
        let breakdown = self.engine.score_against(base_profile, &aligned, base)?;
        let blended = breakdown.blended;

        let mut raw_log = FailureLog::new(ticker);
        let wabp = raw_log.record(Metric::Wabp, breakdown.composite);
        let risk_return = RiskReturnRow {
            ticker: ticker.to_string(),
            start_date: candidate.start_date(),
            end_date: candidate.end_date(),
            wabp,
            additive_sortino: raw_log.record(Metric::AdditiveSortino, breakdown.additive_sortino),
            additive_return_to_max_drawdown: raw_log.record(
                Metric::AdditiveReturnToMaxDrawdown,
                breakdown.additive_return_to_max_drawdown,
            ),
            sharpe: raw_log.record(
                Metric::Sharpe,
                stats::sharpe_ratio(candidate.values(), risk_free, periodicity),
            ),
            sortino: raw_log.record(Metric::Sortino, self.engine.sortino(candidate.values())),
            max_drawdown: raw_log.record(Metric::MaxDrawdown, stats::maximum_drawdown(candidate.values())),
            failures: Vec::new(),
        };
        let risk_return = RiskReturnRow {
            failures: raw_log.into_failures(),
            ..risk_return
        };

        let mut blend_log = FailureLog::new(ticker);
        let blended_row = BlendedPortfolioRow {
            ticker: ticker.to_string(),
            annualized_return: blend_log.record(Metric::Return, self.engine.blended_return(&blended)),
            downside_volatility: blend_log.record(Metric::Volatility, self.engine.blended_risk(&blended)),
            sharpe: blend_log.record(
                Metric::Sharpe,
                stats::sharpe_ratio(blended.values(), risk_free, periodicity),
            ),
            sortino: blend_log.record(Metric::Sortino, self.engine.sortino(blended.values())),
            max_drawdown: blend_log.record(Metric::MaxDrawdown, stats::maximum_drawdown(blended.values())),
            return_to_max_drawdown: blend_log.record(
                Metric::ReturnToMaxDrawdown,
                self.engine.return_to_max_drawdown(blended.values()),
            ),
            // Carried over from the score above; its failure is already on that row.
            wabp,
            failures: blend_log.into_failures(),
        };

        Ok(TickerEvaluation {
            risk_return,
            blended: blended_row,
            blended_series: blended,
        })
    }

    async fn evaluate_ticker(
        &self,
        ticker: &str,
        base: &ReturnSeries,
        base_profile: &RiskProfile,
        range: DateRange,
    ) -> Result<TickerEvaluation, EvaluatorError> {
        let candidate = self.fetch(ticker, range).await?;
        tracing::debug!(ticker, observations = candidate.len(), "Retrieved candidate returns");
        self.evaluate_series(&candidate, base, base_profile)
    }

    /// Evaluates every ticker against `base`.
    ///
    /// A ticker that cannot be retrieved or blended is listed in
    /// [`BatchReport::failures`] and has no rows; the remaining tickers are
    /// unaffected. Dropping the returned future abandons any retrievals still
    /// in flight.
    pub async fn run(&self, tickers: &[String], base: &ReturnSeries, range: DateRange) -> BatchReport {
        let base_profile = self.engine.profile(base);
        for (metric, result) in [
            ("Sortino ratio", &base_profile.sortino),
            ("return to max drawdown", &base_profile.return_to_max_drawdown),
        ] {
            if let Err(e) = result {
                tracing::warn!(base = base.name(), metric, error = %e, "Base portfolio statistic is undefined; WABP scores will be missing");
            }
        }

        let batch_span = tracing::info_span!("batch", base = base.name(), tickers = tickers.len());
        if let Some(style) = &self.progress_style {
            batch_span.pb_set_style(style);
        }
        batch_span.pb_set_length(tickers.len() as u64);

        let outcomes: Vec<(String, Result<TickerEvaluation, EvaluatorError>)> = stream::iter(tickers)
            .map(|ticker| {
                let base_profile = &base_profile;
                let batch_span = &batch_span;
                async move {
                    let outcome = self.evaluate_ticker(ticker, base, base_profile, range).await;
                    batch_span.pb_inc(1);
                    batch_span.pb_set_message(ticker);
                    (ticker.clone(), outcome)
                }
            })
            .buffered(self.max_concurrency)
            .collect::<Vec<_>>()
            .instrument(batch_span.clone())
            .await;

        let mut report = BatchReport {
            run_id: Uuid::new_v4(),
            base_name: base.name().to_string(),
            asset_weight_percent: self.engine.params().weights.asset_percent(),
            risk_return: Table::new(),
            blended: Table::new(),
            failures: Vec::new(),
            blended_series: HashMap::new(),
            base: base.clone(),
        };

        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(evaluation) => {
                    report.risk_return.push(evaluation.risk_return);
                    report.blended.push(evaluation.blended);
                    report.blended_series.insert(ticker, evaluation.blended_series);
                }
                Err(e) => {
                    tracing::warn!(ticker = %ticker, error = %e, "Skipping ticker");
                    report.failures.push(TickerFailure {
                        ticker,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            run_id = %report.run_id,
            evaluated = report.risk_return.len(),
            failed = report.failures.len(),
            "Batch evaluation complete"
        );
        report
    }
}
