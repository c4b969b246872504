use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::{DateRange, Periodicity, PortfolioWeights, RateAssumptions};
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub evaluation: Evaluation,
    pub base_portfolio: BasePortfolio,
    pub universe: Universe,
    pub data: DataSettings,
    #[serde(default)]
    pub logging: Logging,
}

/// Sampling frequency of the return series being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn periodicity(&self) -> Periodicity {
        match self {
            Frequency::Daily => Periodicity::DAILY,
            Frequency::Weekly => Periodicity::WEEKLY,
            Frequency::Monthly => Periodicity::MONTHLY,
        }
    }
}

/// Rate and weighting assumptions for the WABP evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct Evaluation {
    /// Annualized T-bill rate (0.02 = 2%).
    #[serde(default)]
    pub risk_free_rate: f64,
    /// Annualized borrowing cost of the candidate overlay.
    #[serde(default)]
    pub financing_rate: f64,
    /// Candidate weight. Normalized together with `weight_base_portfolio`,
    /// so 0.25 on top of 1.0 is a 20% allocation.
    pub weight_asset: f64,
    pub weight_base_portfolio: f64,
    #[serde(default)]
    pub frequency: Frequency,
    /// Use the risk-free rate, rather than zero, as the downside threshold.
    #[serde(default)]
    pub include_risk_free_in_volatility: bool,
}

/// The stock/bond reference allocation candidates are measured against.
#[derive(Debug, Clone, Deserialize)]
pub struct BasePortfolio {
    pub stock_ticker: String,
    pub bond_ticker: String,
    pub stock_weight: f64,
    pub bond_weight: f64,
    /// Display name; defaults to `stock_<pct>_bond_<pct>`.
    pub name: Option<String>,
}

impl BasePortfolio {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!(
                "stock_{:.0}_bond_{:.0}",
                self.stock_weight * 100.0,
                self.bond_weight * 100.0
            )
        })
    }
}

/// The candidate tickers and the period to evaluate them over.
#[derive(Debug, Clone, Deserialize)]
pub struct Universe {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Where return series are read from.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    pub directory: PathBuf,
    /// Per-ticker retrieval timeout. No timeout when absent.
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    8
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Logging {
    /// When set, logs are also written to a daily rolling file here.
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Checks every value that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rates()?;
        self.weights()?;
        self.date_range()?;

        let base = &self.base_portfolio;
        for (name, weight) in [("stock_weight", base.stock_weight), ("bond_weight", base.bond_weight)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "base_portfolio.{name} must be a finite, non-negative weight (got {weight})"
                )));
            }
        }
        if base.stock_weight + base.bond_weight == 0.0 {
            return Err(ConfigError::ValidationError(
                "base_portfolio weights cannot both be zero".to_string(),
            ));
        }
        if self.universe.tickers.is_empty() {
            return Err(ConfigError::ValidationError(
                "universe.tickers must list at least one ticker".to_string(),
            ));
        }
        if self.data.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "data.max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rates(&self) -> Result<RateAssumptions, ConfigError> {
        Ok(RateAssumptions::new(
            self.evaluation.risk_free_rate,
            self.evaluation.financing_rate,
        )?)
    }

    pub fn weights(&self) -> Result<PortfolioWeights, ConfigError> {
        Ok(PortfolioWeights::new(
            self.evaluation.weight_asset,
            self.evaluation.weight_base_portfolio,
        )?)
    }

    pub fn periodicity(&self) -> Periodicity {
        self.evaluation.frequency.periodicity()
    }

    pub fn date_range(&self) -> Result<DateRange, ConfigError> {
        Ok(DateRange::new(self.universe.start_date, self.universe.end_date)?)
    }
}
