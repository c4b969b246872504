use crate::error::EvaluatorError;
use analytics::EvaluationParams;
use configuration::settings::Config;
use core_types::DateRange;
use std::time::Duration;

/// The stock/bond blend that makes up the base portfolio.
///
/// Unlike candidate weights, these are applied as given: a 60/40 base is
/// written `stock_weight = 0.6, bond_weight = 0.4`.
#[derive(Debug, Clone, PartialEq)]
pub struct BasePortfolioSpec {
    pub name: String,
    pub stock_ticker: String,
    pub bond_ticker: String,
    pub stock_weight: f64,
    pub bond_weight: f64,
}

/// Everything one batch run needs, derived from a validated [`Config`].
#[derive(Debug, Clone)]
pub struct EvaluationPlan {
    pub params: EvaluationParams,
    pub base: BasePortfolioSpec,
    pub tickers: Vec<String>,
    pub range: DateRange,
    pub timeout: Option<Duration>,
    pub max_concurrency: usize,
}

impl EvaluationPlan {
    pub fn from_config(config: &Config) -> Result<Self, EvaluatorError> {
        config.validate()?;
        let params = EvaluationParams {
            rates: config.rates()?,
            weights: config.weights()?,
            periodicity: config.periodicity(),
            include_risk_free_in_volatility: config.evaluation.include_risk_free_in_volatility,
        };
        let base = &config.base_portfolio;

        Ok(Self {
            params,
            base: BasePortfolioSpec {
                name: base.display_name(),
                stock_ticker: base.stock_ticker.clone(),
                bond_ticker: base.bond_ticker.clone(),
                stock_weight: base.stock_weight,
                bond_weight: base.bond_weight,
            },
            tickers: config.universe.tickers.clone(),
            range: config.date_range()?,
            timeout: config.data.timeout_secs.map(Duration::from_secs),
            max_concurrency: config.data.max_concurrency,
        })
    }
}
