use crate::blender::PortfolioBlender;
use crate::error::AnalyticsError;
use crate::stats;
use core_types::{Periodicity, PortfolioWeights, RateAssumptions, ReturnSeries};
use serde::Serialize;

/// Assumptions shared by every score computed in one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationParams {
    pub rates: RateAssumptions,
    pub weights: PortfolioWeights,
    pub periodicity: Periodicity,
    pub include_risk_free_in_volatility: bool,
}

/// The two risk-adjusted dimensions the WABP score compares.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskProfile {
    pub sortino: Result<f64, AnalyticsError>,
    pub return_to_max_drawdown: Result<f64, AnalyticsError>,
}

/// Everything the score engine derives from blending one candidate.
#[derive(Debug, Clone)]
pub struct WabpBreakdown {
    pub blended: ReturnSeries,
    pub composite: Result<f64, AnalyticsError>,
    pub additive_sortino: Result<f64, AnalyticsError>,
    pub additive_return_to_max_drawdown: Result<f64, AnalyticsError>,
}

/// Scores a candidate asset by how much blending it into the base portfolio
/// improves the base's Sortino ratio and return-to-max-drawdown ratio.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    params: EvaluationParams,
    blender: PortfolioBlender,
}

impl ScoreEngine {
    pub fn new(params: EvaluationParams) -> Self {
        let blender = PortfolioBlender::new(
            params.weights,
            params.rates.financing_annual,
            params.periodicity,
        );
        Self { params, blender }
    }

    pub fn params(&self) -> &EvaluationParams {
        &self.params
    }

    pub fn blender(&self) -> &PortfolioBlender {
        &self.blender
    }

    pub fn sortino(&self, returns: &[f64]) -> Result<f64, AnalyticsError> {
        stats::sortino_ratio(
            returns,
            self.params.rates.risk_free_annual,
            self.params.periodicity,
            self.params.include_risk_free_in_volatility,
        )
    }

    pub fn return_to_max_drawdown(&self, returns: &[f64]) -> Result<f64, AnalyticsError> {
        stats::return_to_max_drawdown_ratio(
            returns,
            self.params.rates.risk_free_annual,
            self.params.periodicity,
        )
    }

    pub fn profile(&self, series: &ReturnSeries) -> RiskProfile {
        RiskProfile {
            sortino: self.sortino(series.values()),
            return_to_max_drawdown: self.return_to_max_drawdown(series.values()),
        }
    }

    /// Blends `candidate` into `base` and scores it against a precomputed
    /// profile of `base`. Only a failed blend is an error here; individual
    /// scores carry their own failures.
    pub fn score_against(
        &self,
        base_profile: &RiskProfile,
        candidate: &ReturnSeries,
        base: &ReturnSeries,
    ) -> Result<WabpBreakdown, AnalyticsError> {
        let blended = self.blender.blend(candidate, base)?;
        let blended_profile = self.profile(&blended);

        let sortino_ratio = relative(&blended_profile.sortino, &base_profile.sortino, "Sortino ratio");
        let rmdd_ratio = relative(
            &blended_profile.return_to_max_drawdown,
            &base_profile.return_to_max_drawdown,
            "return to max drawdown",
        );

        let composite = match (&sortino_ratio, &rmdd_ratio) {
            (Ok(s), Ok(r)) => composite_score(*r, *s),
            (Err(e), _) | (_, Err(e)) => Err(e.clone()),
        };

        Ok(WabpBreakdown {
            blended,
            composite,
            additive_sortino: sortino_ratio.map(to_percent_change),
            additive_return_to_max_drawdown: rmdd_ratio.map(to_percent_change),
        })
    }

    pub fn breakdown(
        &self,
        candidate: &ReturnSeries,
        base: &ReturnSeries,
    ) -> Result<WabpBreakdown, AnalyticsError> {
        self.score_against(&self.profile(base), candidate, base)
    }

    /// The composite "win above base portfolio" score, in percent.
    pub fn win_above_base_portfolio(
        &self,
        candidate: &ReturnSeries,
        base: &ReturnSeries,
    ) -> Result<f64, AnalyticsError> {
        self.breakdown(candidate, base)?.composite
    }

    /// Percent change in the Sortino ratio from blending in the candidate.
    pub fn additive_sortino(
        &self,
        candidate: &ReturnSeries,
        base: &ReturnSeries,
    ) -> Result<f64, AnalyticsError> {
        self.breakdown(candidate, base)?.additive_sortino
    }

    /// Percent change in the return-to-max-drawdown ratio from blending in the
    /// candidate.
    pub fn additive_return_to_max_drawdown(
        &self,
        candidate: &ReturnSeries,
        base: &ReturnSeries,
    ) -> Result<f64, AnalyticsError> {
        self.breakdown(candidate, base)?.additive_return_to_max_drawdown
    }

    /// Annualized return of the blended portfolio in excess of the annual
    /// risk-free rate.
    pub fn portfolio_return(
        &self,
        candidate: &ReturnSeries,
        base: &ReturnSeries,
    ) -> Result<f64, AnalyticsError> {
        let blended = self.blender.blend(candidate, base)?;
        self.blended_return(&blended)
    }

    /// Annualized target downside deviation (threshold zero) of the blended
    /// portfolio.
    pub fn portfolio_risk(
        &self,
        candidate: &ReturnSeries,
        base: &ReturnSeries,
    ) -> Result<f64, AnalyticsError> {
        let blended = self.blender.blend(candidate, base)?;
        self.blended_risk(&blended)
    }

    pub fn blended_return(&self, blended: &ReturnSeries) -> Result<f64, AnalyticsError> {
        Ok(stats::annualized_return(blended.values(), self.params.periodicity)?
            - self.params.rates.risk_free_annual)
    }

    pub fn blended_risk(&self, blended: &ReturnSeries) -> Result<f64, AnalyticsError> {
        Ok(stats::target_downside_deviation(blended.values(), 0.0)?
            * self.params.periodicity.annualization_factor())
    }
}

/// Geometric mean of the two improvement ratios, as a percent change.
///
/// A negative product has no real square root; it is reported as
/// [`AnalyticsError::InvalidComposite`] rather than coerced.
pub fn composite_score(
    return_to_max_drawdown_ratio: f64,
    sortino_ratio: f64,
) -> Result<f64, AnalyticsError> {
    let radicand = return_to_max_drawdown_ratio * sortino_ratio;
    if radicand < 0.0 || radicand.is_nan() {
        return Err(AnalyticsError::InvalidComposite { radicand });
    }
    Ok(to_percent_change(radicand.sqrt()))
}

fn to_percent_change(ratio: f64) -> f64 {
    (ratio - 1.0) * 100.0
}

fn relative(
    blended: &Result<f64, AnalyticsError>,
    base: &Result<f64, AnalyticsError>,
    statistic: &'static str,
) -> Result<f64, AnalyticsError> {
    let base = base.clone()?;
    let blended = blended.clone()?;
    if base == 0.0 {
        return Err(AnalyticsError::degenerate(
            statistic,
            "base portfolio value is zero, improvement is undefined",
        ));
    }
    Ok(blended / base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn composite_of_known_ratios() {
        // base Sortino 1.0 / RMDD 2.0, blended Sortino 1.5 / RMDD 2.5
        let score = composite_score(2.5 / 2.0, 1.5 / 1.0).unwrap();
        assert_relative_eq!(score, (1.875_f64.sqrt() - 1.0) * 100.0, epsilon = 1e-12);
        assert_relative_eq!(score, 36.93, epsilon = 0.01);
        assert_relative_eq!(to_percent_change(1.5 / 1.0), 50.0, epsilon = 1e-12);
    }

    #[test]
    fn negative_radicand_is_distinct_from_negative_score() {
        assert!(matches!(
            composite_score(-0.5, 1.2),
            Err(AnalyticsError::InvalidComposite { .. })
        ));
        let underperforms = composite_score(0.8, 0.9).unwrap();
        assert!(underperforms < 0.0);
    }

    #[test]
    fn engine_sortino_honors_risk_free_threshold_flag() {
        let params = |include_risk_free_in_volatility| EvaluationParams {
            rates: RateAssumptions::new(0.3, 0.0).unwrap(),
            weights: PortfolioWeights::new(0.2, 0.8).unwrap(),
            periodicity: Periodicity::DAILY,
            include_risk_free_in_volatility,
        };
        let r = [0.001, 0.002];

        let with_rf = ScoreEngine::new(params(true)).sortino(&r).unwrap();
        assert_relative_eq!(
            with_rf,
            stats::sortino_ratio(&r, 0.3, Periodicity::DAILY, true).unwrap()
        );
        assert!(with_rf.is_finite());
        assert!(ScoreEngine::new(params(false)).sortino(&r).is_err());
    }

    #[test]
    fn zero_base_statistic_is_degenerate() {
        let err = relative(&Ok(1.0), &Ok(0.0), "Sortino ratio").unwrap_err();
        assert!(matches!(err, AnalyticsError::DegenerateStatistic { .. }));
    }

    #[test]
    fn base_failure_propagates_to_ratio() {
        let base = Err(AnalyticsError::NotEnoughData("empty".to_string()));
        assert_eq!(relative(&Ok(1.0), &base, "Sortino ratio"), base);
    }
}
