//! Backtest scenarios with hand-computed expectations.

use altalpha_core::domain::{FeatureRow, FeatureSeries, Signal};
use altalpha_core::engine::{run_backtest, BacktestEngine, SimulationParams};
use altalpha_core::signals::SignalRule;
use chrono::NaiveDate;

const EPS: f64 = 1e-9;

fn constant_series(days: usize, sentiment: f64, volatility: f64, ret: f64) -> FeatureSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let rows = (0..days)
        .map(|i| FeatureRow {
            date: start + chrono::Duration::days(i as i64),
            close: 100.0 * (1.0 + ret).powi(i as i32),
            daily_return: Some(ret),
            sentiment: Some(sentiment),
            sentiment_avg_5d: Some(sentiment),
            volatility_5d: Some(volatility),
        })
        .collect();
    FeatureSeries::new("SCN", rows).unwrap()
}

#[test]
fn twelve_day_long_scenario_compounds_from_day_two() {
    let series = constant_series(12, 0.5, 0.0, 0.01);
    let engine = BacktestEngine::new(&series);
    // Any positive volatility threshold admits volatility 0.
    let run = engine.run_rule(SignalRule::new(0.2, Some(0.01)), 10_000.0, 0.0);

    assert_eq!(run.rows.len(), 12);
    assert!(run.rows.iter().all(|r| r.signal == Signal::Long));
    assert_eq!(run.rows[0].position, Signal::Flat);
    assert!(run.rows[1..].iter().all(|r| r.position == Signal::Long));

    assert!((run.rows[0].portfolio_value - 10_000.0).abs() < EPS);
    for t in 1..12 {
        let expected = 10_000.0 * 1.01_f64.powi(t as i32);
        assert!(
            (run.rows[t].portfolio_value - expected).abs() < 1e-6,
            "day {t}: {} != {expected}",
            run.rows[t].portfolio_value
        );
        let growth = run.rows[t].portfolio_value / run.rows[t - 1].portfolio_value;
        assert!((growth - 1.01).abs() < 1e-12);
    }
    assert_eq!(run.trade_count, 1);
}

#[test]
fn constant_negative_sentiment_is_short_regardless_of_volatility() {
    for volatility in [0.0, 0.05, 10.0] {
        let series = constant_series(8, -0.5, volatility, 0.01);
        let run = run_backtest(&series, &SimulationParams::default());
        assert!(run.rows.iter().all(|r| r.signal == Signal::Short));
        assert_eq!(run.rows[0].position, Signal::Flat);
        assert!(run.rows[1..].iter().all(|r| r.position == Signal::Short));
        // Short earns the negated return
        assert!((run.rows[2].strategy_return + 0.01).abs() < 1e-12);
    }
}

#[test]
fn flat_every_day_with_zero_cost_keeps_capital() {
    let series = constant_series(30, 0.0, 0.02, 0.03);
    let params = SimulationParams {
        transaction_cost: 0.0,
        ..SimulationParams::default()
    };
    let run = run_backtest(&series, &params);
    assert!(run.rows.iter().all(|r| r.strategy_return == 0.0));
    assert!(run.rows.iter().all(|r| r.portfolio_value == 10_000.0));
    assert_eq!(run.trade_count, 0);
}

#[test]
fn all_zero_volatility_column_blocks_long() {
    // The median of an all-zero column is 0 and the filter is strict.
    let series = constant_series(12, 0.5, 0.0, 0.01);
    let run = run_backtest(&series, &SimulationParams::default());
    assert_eq!(run.rule.volatility_threshold, Some(0.0));
    assert!(run.rows.iter().all(|r| r.signal == Signal::Flat));
}

#[test]
fn missing_volatility_everywhere_forces_flat() {
    let mut rows = constant_series(6, 0.5, 0.0, 0.01).rows().to_vec();
    for row in &mut rows {
        row.volatility_5d = None;
    }
    let series = FeatureSeries::new("SCN", rows).unwrap();
    let run = run_backtest(&series, &SimulationParams::default());
    assert_eq!(run.rule.volatility_threshold, None);
    assert!(run.rows.iter().all(|r| r.signal == Signal::Flat));
}

#[test]
fn market_returns_treat_missing_as_zero() {
    let mut rows = constant_series(3, 0.0, 0.01, 0.02).rows().to_vec();
    rows[0].daily_return = None;
    let series = FeatureSeries::new("SCN", rows).unwrap();
    let run = run_backtest(&series, &SimulationParams::default());
    assert_eq!(run.market_returns(), vec![0.0, 0.02, 0.02]);
}
