use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of return periods in one year.
///
/// Every ratio computed within one evaluation is annualized with the same
/// periodicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Periodicity(u32);

impl Periodicity {
    /// Trading days in a year.
    pub const DAILY: Periodicity = Periodicity(252);
    pub const WEEKLY: Periodicity = Periodicity(52);
    pub const MONTHLY: Periodicity = Periodicity(12);

    pub fn new(periods_per_year: u32) -> Result<Self, CoreError> {
        if periods_per_year == 0 {
            return Err(CoreError::InvalidInput(
                "periodicity".to_string(),
                "must be a positive number of periods per year".to_string(),
            ));
        }
        Ok(Self(periods_per_year))
    }

    pub fn periods_per_year(&self) -> u32 {
        self.0
    }

    /// Converts an annualized rate into the equivalent compound per-period rate.
    pub fn per_period_rate(&self, annual_rate: f64) -> f64 {
        (1.0 + annual_rate).powf(1.0 / f64::from(self.0)) - 1.0
    }

    /// The `sqrt(periods)` scaling applied to per-period ratios.
    pub fn annualization_factor(&self) -> f64 {
        f64::from(self.0).sqrt()
    }
}

impl Default for Periodicity {
    fn default() -> Self {
        Self::DAILY
    }
}

impl TryFrom<u32> for Periodicity {
    type Error = CoreError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Periodicity> for u32 {
    fn from(value: Periodicity) -> Self {
        value.0
    }
}

/// Annualized risk-free and financing rates, expressed as decimals (0.02 = 2%).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RateAssumptions {
    pub risk_free_annual: f64,
    pub financing_annual: f64,
}

impl RateAssumptions {
    pub fn new(risk_free_annual: f64, financing_annual: f64) -> Result<Self, CoreError> {
        for (name, rate) in [("risk_free_rate", risk_free_annual), ("financing_rate", financing_annual)] {
            // A rate at or below -100% has no real per-period equivalent.
            if !rate.is_finite() || rate <= -1.0 {
                return Err(CoreError::InvalidInput(
                    name.to_string(),
                    format!("{rate} is not a usable annual rate"),
                ));
            }
        }
        Ok(Self {
            risk_free_annual,
            financing_annual,
        })
    }
}

/// Relative weights of the candidate asset and the base portfolio in a blend.
///
/// The pair does not have to sum to one: a 25% overlay on a fully invested
/// base is written `(0.25, 1.0)` and is blended as 20%/80%. See
/// [`PortfolioWeights::fractions`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioWeights {
    pub asset: f64,
    pub base: f64,
}

impl PortfolioWeights {
    pub fn new(asset: f64, base: f64) -> Result<Self, CoreError> {
        for (name, weight) in [("weight_asset", asset), ("weight_base_portfolio", base)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CoreError::InvalidInput(
                    name.to_string(),
                    format!("{weight} must be a finite, non-negative weight"),
                ));
            }
        }
        if asset + base == 0.0 {
            return Err(CoreError::InvalidInput(
                "portfolio weights".to_string(),
                "asset and base weights cannot both be zero".to_string(),
            ));
        }
        Ok(Self { asset, base })
    }

    /// The weights normalized by their sum, as `(asset, base)`.
    pub fn fractions(&self) -> (f64, f64) {
        let total = self.asset + self.base;
        (self.asset / total, self.base / total)
    }

    /// Normalized asset weight as a rounded percentage, used in column labels.
    pub fn asset_percent(&self) -> u32 {
        (self.fractions().0 * 100.0).round() as u32
    }
}

/// An inclusive calendar range used when requesting return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidInput(
                "date range".to_string(),
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn periodicity_rejects_zero() {
        assert!(Periodicity::new(0).is_err());
        assert_eq!(Periodicity::new(12).unwrap(), Periodicity::MONTHLY);
    }

    #[test]
    fn per_period_rate_compounds_back_to_annual() {
        let p = Periodicity::DAILY;
        let daily = p.per_period_rate(0.05);
        assert_relative_eq!((1.0 + daily).powi(252), 1.05, epsilon = 1e-12);
        assert_eq!(p.per_period_rate(0.0), 0.0);
    }

    #[test]
    fn overlay_weights_normalize_to_fractions() {
        let w = PortfolioWeights::new(0.25, 1.0).unwrap();
        let (asset, base) = w.fractions();
        assert_relative_eq!(asset, 0.2);
        assert_relative_eq!(base, 0.8);
        assert_eq!(w.asset_percent(), 20);
    }

    #[test]
    fn pre_normalized_weights_are_unchanged() {
        let w = PortfolioWeights::new(0.2, 0.8).unwrap();
        assert_eq!(w.fractions(), (0.2, 0.8));
    }

    #[test]
    fn invalid_weights_are_rejected() {
        assert!(PortfolioWeights::new(0.0, 0.0).is_err());
        assert!(PortfolioWeights::new(-0.1, 1.0).is_err());
        assert!(PortfolioWeights::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let a = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert!(DateRange::new(b, a).is_err());
        assert!(DateRange::new(a, b).unwrap().contains(a));
    }
}
