use crate::error::AnalyticsError;
use core_types::{CoreError, Periodicity, PortfolioWeights, ReturnSeries};

/// Combines a candidate asset with a base portfolio.
///
/// The candidate is financed at the per-period financing rate, and the two
/// legs are weighted by [`PortfolioWeights::fractions`], i.e. always
/// normalized by the sum of the weights.
#[derive(Debug, Clone, Copy)]
pub struct PortfolioBlender {
    weights: PortfolioWeights,
    financing_per_period: f64,
}

impl PortfolioBlender {
    pub fn new(weights: PortfolioWeights, financing_annual: f64, periodicity: Periodicity) -> Self {
        Self {
            weights,
            financing_per_period: periodicity.per_period_rate(financing_annual),
        }
    }

    /// Produces `(candidate - financing) * w_asset + base * w_base` for each
    /// date. Both series must share the same index; the result keeps the
    /// candidate's name.
    ///
    /// With a zero asset weight the candidate leg is left out entirely, so a
    /// missing candidate value cannot mask a base observation.
    pub fn blend(
        &self,
        candidate: &ReturnSeries,
        base: &ReturnSeries,
    ) -> Result<ReturnSeries, AnalyticsError> {
        if !candidate.same_index(base) {
            return Err(CoreError::IndexMismatch {
                left: candidate.name().to_string(),
                right: base.name().to_string(),
            }
            .into());
        }

        let (w_asset, w_base) = self.weights.fractions();
        let values = candidate
            .values()
            .iter()
            .zip(base.values())
            .map(|(c, b)| {
                if w_asset == 0.0 {
                    b * w_base
                } else {
                    (c - self.financing_per_period) * w_asset + b * w_base
                }
            })
            .collect();

        tracing::debug!(
            candidate = candidate.name(),
            base = base.name(),
            w_asset,
            w_base,
            "Blended candidate into base portfolio"
        );
        Ok(ReturnSeries::new(candidate.name(), base.dates().to_vec(), values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(name: &str, values: Vec<f64>) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..values.len() as u64)
            .map(|i| start + chrono::Days::new(i))
            .collect();
        ReturnSeries::new(name, dates, values).unwrap()
    }

    #[test]
    fn blends_constant_series() {
        let blender = PortfolioBlender::new(
            PortfolioWeights::new(0.2, 0.8).unwrap(),
            0.0,
            Periodicity::DAILY,
        );
        let blended = blender
            .blend(&series("cand", vec![0.0004; 252]), &series("base", vec![0.0002; 252]))
            .unwrap();
        assert_eq!(blended.len(), 252);
        assert_eq!(blended.name(), "cand");
        for v in blended.values() {
            assert_relative_eq!(*v, 0.00024, epsilon = 1e-15);
        }
    }

    #[test]
    fn financing_is_charged_to_the_candidate_leg() {
        let periodicity = Periodicity::MONTHLY;
        let financing = 0.06;
        let blender = PortfolioBlender::new(PortfolioWeights::new(0.25, 1.0).unwrap(), financing, periodicity);
        let blended = blender
            .blend(&series("cand", vec![0.02]), &series("base", vec![0.01]))
            .unwrap();
        let expected = (0.02 - periodicity.per_period_rate(financing)) * 0.2 + 0.01 * 0.8;
        assert_relative_eq!(blended.values()[0], expected, epsilon = 1e-15);
    }

    #[test]
    fn zero_candidate_weight_reproduces_base() {
        let base = series("base", vec![0.01, -0.02, 0.005]);
        let blender = PortfolioBlender::new(PortfolioWeights::new(0.0, 1.0).unwrap(), 0.03, Periodicity::DAILY);
        let blended = blender.blend(&series("cand", vec![0.5, 0.4, -0.3]), &base).unwrap();
        assert_eq!(blended.values(), base.values());
    }

    #[test]
    fn zero_candidate_weight_ignores_missing_candidate_values() {
        let base = series("base", vec![0.01, -0.02, 0.005]);
        let blender = PortfolioBlender::new(PortfolioWeights::new(0.0, 1.0).unwrap(), 0.03, Periodicity::DAILY);
        let blended = blender
            .blend(&series("cand", vec![f64::NAN, f64::NAN, 0.2]), &base)
            .unwrap();
        assert_eq!(blended.values(), base.values());
    }

    #[test]
    fn missing_candidate_value_propagates() {
        let blender = PortfolioBlender::new(PortfolioWeights::new(0.2, 0.8).unwrap(), 0.0, Periodicity::DAILY);
        let blended = blender
            .blend(&series("cand", vec![f64::NAN, 0.01]), &series("base", vec![0.01, 0.01]))
            .unwrap();
        assert!(blended.values()[0].is_nan());
        assert!(!blended.values()[1].is_nan());
    }

    #[test]
    fn mismatched_indexes_are_rejected() {
        let blender = PortfolioBlender::new(PortfolioWeights::new(0.2, 0.8).unwrap(), 0.0, Periodicity::DAILY);
        let err = blender
            .blend(&series("cand", vec![0.01; 3]), &series("base", vec![0.01; 4]))
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Configuration(CoreError::IndexMismatch { .. })
        ));
    }
}
