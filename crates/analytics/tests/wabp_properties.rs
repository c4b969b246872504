use analytics::{stats, AnalyticsError, EvaluationParams, PortfolioBlender, ScoreEngine};
use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use core_types::{Periodicity, PortfolioWeights, RateAssumptions, ReturnSeries};

fn series(name: &str, values: Vec<f64>) -> ReturnSeries {
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    let dates = (0..values.len() as u64).map(|i| start + Days::new(i)).collect();
    ReturnSeries::new(name, dates, values).unwrap()
}

/// A deterministic, noisy daily series with both gains and losses.
fn noisy(name: &str, drift: f64, amplitude: f64, len: usize) -> ReturnSeries {
    let values = (0..len)
        .map(|i| {
            let i = i as f64;
            drift + amplitude * ((i * 0.7).sin() + 0.5 * (i * 1.3).cos())
        })
        .collect();
    series(name, values)
}

fn engine(asset: f64, base: f64, risk_free: f64, financing: f64) -> ScoreEngine {
    ScoreEngine::new(EvaluationParams {
        rates: RateAssumptions::new(risk_free, financing).unwrap(),
        weights: PortfolioWeights::new(asset, base).unwrap(),
        periodicity: Periodicity::DAILY,
        include_risk_free_in_volatility: false,
    })
}

#[test]
fn zero_candidate_weight_scores_zero() {
    let candidate = noisy("gld", 0.0003, 0.01, 500);
    let base = noisy("stock_60_bond_40", 0.0004, 0.008, 500);
    let engine = engine(0.0, 1.0, 0.01, 0.02);

    assert_eq!(engine.win_above_base_portfolio(&candidate, &base).unwrap(), 0.0);
    assert_eq!(engine.additive_sortino(&candidate, &base).unwrap(), 0.0);
    assert_eq!(engine.additive_return_to_max_drawdown(&candidate, &base).unwrap(), 0.0);
}

#[test]
fn zero_candidate_weight_scores_zero_with_missing_candidate_history() {
    let base = noisy("stock_60_bond_40", 0.0004, 0.008, 300);
    let late = noisy("qqq", 0.0007, 0.014, 300);
    let values = late
        .values()
        .iter()
        .enumerate()
        .map(|(i, v)| if i < 100 { f64::NAN } else { *v })
        .collect();
    let candidate = series("qqq", values);
    let engine = engine(0.0, 1.0, 0.0, 0.0);

    let breakdown = engine.breakdown(&candidate, &base).unwrap();
    assert_eq!(breakdown.blended.values(), base.values());
    assert_eq!(breakdown.composite.unwrap(), 0.0);
    assert_eq!(breakdown.additive_sortino.unwrap(), 0.0);
    assert_eq!(breakdown.additive_return_to_max_drawdown.unwrap(), 0.0);
}

#[test]
fn full_candidate_weight_without_financing_reproduces_candidate_ratio() {
    let candidate = noisy("tlt", 0.0002, 0.006, 300);
    let base = noisy("spy", 0.0005, 0.011, 300);
    let blender = PortfolioBlender::new(PortfolioWeights::new(1.0, 0.0).unwrap(), 0.0, Periodicity::DAILY);

    let blended = blender.blend(&candidate, &base).unwrap();
    let direct = stats::return_to_max_drawdown_ratio(candidate.values(), 0.02, Periodicity::DAILY).unwrap();
    let via_blend = stats::return_to_max_drawdown_ratio(blended.values(), 0.02, Periodicity::DAILY).unwrap();
    assert_eq!(direct, via_blend);
}

#[test]
fn riskless_blend_has_no_drawdown_and_undefined_sortino() {
    let candidate = series("cash_plus", vec![0.0004; 252]);
    let base = series("base", vec![0.0002; 252]);
    let engine = engine(0.2, 0.8, 0.0, 0.0);

    let blended = engine.blender().blend(&candidate, &base).unwrap();
    assert!(blended.values().iter().all(|v| (v - 0.00024).abs() < 1e-15));
    assert_eq!(stats::maximum_drawdown(blended.values()).unwrap(), 0.0);
    assert!(matches!(
        engine.sortino(blended.values()),
        Err(AnalyticsError::DegenerateStatistic { .. })
    ));
    // The base itself is degenerate, so the composite cannot be formed either.
    assert!(engine.win_above_base_portfolio(&candidate, &base).is_err());
}

#[test]
fn overlay_weights_match_pre_normalized_weights() {
    let candidate = noisy("qqq", 0.0006, 0.015, 400);
    let base = noisy("base", 0.0004, 0.008, 400);

    let overlay = engine(0.25, 1.0, 0.0, 0.01).breakdown(&candidate, &base).unwrap();
    let fractions = engine(0.2, 0.8, 0.0, 0.01).breakdown(&candidate, &base).unwrap();

    assert_relative_eq!(overlay.composite.unwrap(), fractions.composite.unwrap(), epsilon = 1e-9);
}

#[test]
fn breakdown_is_consistent_with_individual_scores() {
    let candidate = noisy("hyg", 0.0003, 0.004, 600);
    let base = noisy("base", 0.0004, 0.009, 600);
    let engine = engine(0.25, 1.0, 0.015, 0.02);

    let breakdown = engine.breakdown(&candidate, &base).unwrap();
    let sortino = breakdown.additive_sortino.clone().unwrap();
    let rmdd = breakdown.additive_return_to_max_drawdown.clone().unwrap();

    let expected = (((1.0 + sortino / 100.0) * (1.0 + rmdd / 100.0)).sqrt() - 1.0) * 100.0;
    assert_relative_eq!(breakdown.composite.clone().unwrap(), expected, epsilon = 1e-9);
    assert_eq!(engine.additive_sortino(&candidate, &base).unwrap(), sortino);
    assert_eq!(engine.additive_return_to_max_drawdown(&candidate, &base).unwrap(), rmdd);
}

#[test]
fn portfolio_return_and_risk_describe_the_blend() {
    let candidate = noisy("efa", 0.0002, 0.012, 252);
    let base = noisy("base", 0.0004, 0.008, 252);
    let engine = engine(0.2, 0.8, 0.01, 0.0);
    let blended = engine.blender().blend(&candidate, &base).unwrap();

    let expected_return = stats::annualized_return(blended.values(), Periodicity::DAILY).unwrap() - 0.01;
    let expected_risk = stats::target_downside_deviation(blended.values(), 0.0).unwrap() * 252_f64.sqrt();
    assert_relative_eq!(engine.portfolio_return(&candidate, &base).unwrap(), expected_return);
    assert_relative_eq!(engine.portfolio_risk(&candidate, &base).unwrap(), expected_risk);
}
