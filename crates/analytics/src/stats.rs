//! Return-series statistics.
//!
//! All reductions skip missing (`NaN`) observations rather than treating them
//! as zero. Functions that can hit a division by zero return
//! [`AnalyticsError::DegenerateStatistic`] instead of an infinite or `NaN`
//! value.

use crate::error::AnalyticsError;
use core_types::Periodicity;

fn observed(returns: &[f64]) -> impl Iterator<Item = f64> + '_ {
    returns.iter().copied().filter(|r| !r.is_nan())
}

fn nan_mean(returns: &[f64]) -> Option<f64> {
    let (sum, count) = observed(returns).fold((0.0, 0usize), |(s, n), r| (s + r, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Annualized Sharpe ratio: mean excess return over sample standard deviation,
/// scaled by `sqrt(periodicity)`.
pub fn sharpe_ratio(
    returns: &[f64],
    risk_free_annual: f64,
    periodicity: Periodicity,
) -> Result<f64, AnalyticsError> {
    let values: Vec<f64> = observed(returns).collect();
    if values.len() < 2 {
        return Err(AnalyticsError::NotEnoughData(format!(
            "Sharpe ratio needs at least two observations, got {}",
            values.len()
        )));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return Err(AnalyticsError::degenerate(
            "Sharpe ratio",
            "standard deviation of returns is zero",
        ));
    }

    let risk_free = periodicity.per_period_rate(risk_free_annual);
    Ok((mean - risk_free) / std_dev * periodicity.annualization_factor())
}

/// Root-mean-square of the shortfall below `minimum_acceptable_return`.
///
/// Observations at or above the threshold contribute zero; missing
/// observations are left out of the mean.
pub fn target_downside_deviation(
    returns: &[f64],
    minimum_acceptable_return: f64,
) -> Result<f64, AnalyticsError> {
    let shortfalls: Vec<f64> = observed(returns)
        .map(|r| (r - minimum_acceptable_return).min(0.0))
        .collect();
    if shortfalls.is_empty() {
        return Err(AnalyticsError::NotEnoughData(
            "target downside deviation of an empty series".to_string(),
        ));
    }
    let mean_square = shortfalls.iter().map(|s| s * s).sum::<f64>() / shortfalls.len() as f64;
    Ok(mean_square.sqrt())
}

/// Annualized Sortino ratio.
///
/// The downside threshold is the per-period risk-free rate when
/// `include_risk_free_in_volatility` is set, otherwise zero.
pub fn sortino_ratio(
    returns: &[f64],
    risk_free_annual: f64,
    periodicity: Periodicity,
    include_risk_free_in_volatility: bool,
) -> Result<f64, AnalyticsError> {
    let risk_free = periodicity.per_period_rate(risk_free_annual);
    let mean = nan_mean(returns).ok_or_else(|| {
        AnalyticsError::NotEnoughData("Sortino ratio of an empty series".to_string())
    })?;
    let threshold = if include_risk_free_in_volatility {
        risk_free
    } else {
        0.0
    };

    let downside = target_downside_deviation(returns, threshold)?;
    if downside == 0.0 {
        return Err(AnalyticsError::degenerate(
            "Sortino ratio",
            "no returns fell below the downside threshold",
        ));
    }
    Ok((mean - risk_free) / downside * periodicity.annualization_factor())
}

/// Growth of one unit of capital through the series. A missing return leaves
/// the running value unchanged.
pub fn cumulative_growth(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |nav, r| {
            if !r.is_nan() {
                *nav *= 1.0 + r;
            }
            Some(*nav)
        })
        .collect()
}

/// Compound annual growth rate over the whole series.
///
/// The exponent uses the full length of the series, so missing observations
/// still count as elapsed periods.
pub fn annualized_return(returns: &[f64], periodicity: Periodicity) -> Result<f64, AnalyticsError> {
    let Some(&ending_value) = cumulative_growth(returns).last() else {
        return Err(AnalyticsError::NotEnoughData(
            "annualized return of an empty series".to_string(),
        ));
    };
    if ending_value < 0.0 {
        return Err(AnalyticsError::degenerate(
            "annualized return",
            format!("cumulative value fell below zero ({ending_value})"),
        ));
    }
    let years = returns.len() as f64 / f64::from(periodicity.periods_per_year());
    Ok(ending_value.powf(1.0 / years) - 1.0)
}

/// Drawdown from the running peak at each point, as a non-positive fraction.
///
/// The peak is tracked over the compounded values themselves, so a loss on the
/// very first period sets the first peak rather than registering a drawdown.
pub fn drawdown_series(returns: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    cumulative_growth(returns)
        .into_iter()
        .map(|value| {
            peak = peak.max(value);
            (value - peak) / peak
        })
        .collect()
}

/// Largest peak-to-trough decline, reported as a positive magnitude.
pub fn maximum_drawdown(returns: &[f64]) -> Result<f64, AnalyticsError> {
    drawdown_series(returns)
        .into_iter()
        .filter(|dd| !dd.is_nan())
        .reduce(f64::min)
        .map(f64::abs)
        .ok_or_else(|| {
            AnalyticsError::NotEnoughData("maximum drawdown of an empty series".to_string())
        })
}

/// Annualized return in excess of the per-period risk-free rate, divided by
/// the maximum drawdown.
pub fn return_to_max_drawdown_ratio(
    returns: &[f64],
    risk_free_annual: f64,
    periodicity: Periodicity,
) -> Result<f64, AnalyticsError> {
    let risk_free = periodicity.per_period_rate(risk_free_annual);
    let annual_return = annualized_return(returns, periodicity)?;
    let max_drawdown = maximum_drawdown(returns)?;
    if max_drawdown == 0.0 {
        return Err(AnalyticsError::degenerate(
            "return to max drawdown",
            "series never drew down",
        ));
    }
    Ok((annual_return - risk_free) / max_drawdown)
}
