//! Look-ahead contamination tests.
//!
//! Invariant: the position used to compute the strategy return on day t is a
//! function only of rows at indices < t.
//!
//! Method: evaluate on a truncated series (rows 0..k) and on the full series,
//! or perturb every row from t onward, and assert the earlier positions and
//! features are identical. Any difference means future data leaked backward.

use altalpha_core::domain::{FeatureSeries, Signal};
use altalpha_core::features::merge_price_and_sentiment;
use altalpha_core::signals::{lagged_positions, SignalRule};
use altalpha_core::synthetic::{synthetic_prices, synthetic_sentiment};
use chrono::NaiveDate;

fn make_series(ticker: &str) -> FeatureSeries {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 12, 29).unwrap();
    let prices = synthetic_prices(ticker, start, end);
    let dates: Vec<_> = prices.iter().map(|b| b.date).collect();
    let sentiment = synthetic_sentiment(ticker, &dates);
    merge_price_and_sentiment(ticker, &prices, &sentiment).unwrap()
}

#[test]
fn positions_do_not_depend_on_same_day_or_future_rows() {
    let series = make_series("SPY");
    // Low threshold so all three states occur.
    let rule = SignalRule::new(0.05, Some(0.015));
    let full = lagged_positions(&rule.signals(series.rows()));

    for t in [1usize, 10, 50, 120, series.len() - 1] {
        // Overwrite rows t.. with extreme values
        let mut rows = series.rows().to_vec();
        for row in rows.iter_mut().skip(t) {
            row.sentiment_avg_5d = Some(-0.99);
            row.volatility_5d = Some(0.5);
        }
        let perturbed = FeatureSeries::new(series.ticker(), rows).unwrap();
        let positions = lagged_positions(&rule.signals(perturbed.rows()));

        assert_eq!(
            &positions[..=t],
            &full[..=t],
            "position at or before day {t} changed when rows {t}.. were perturbed"
        );
    }
}

#[test]
fn truncated_and_full_positions_agree() {
    let series = make_series("QQQ");
    let rule = SignalRule::new(0.05, Some(0.015));
    let full = lagged_positions(&rule.signals(series.rows()));

    let k = series.len() / 2;
    let truncated = FeatureSeries::new(series.ticker(), series.rows()[..k].to_vec()).unwrap();
    let partial = lagged_positions(&rule.signals(truncated.rows()));

    assert_eq!(partial.len(), k);
    assert_eq!(&partial[..], &full[..k]);
}

#[test]
fn first_position_is_always_flat() {
    let series = make_series("IWM");
    let rule = SignalRule::new(-1.0, Some(1.0));
    let positions = lagged_positions(&rule.signals(series.rows()));
    assert_eq!(positions[0], Signal::Flat);
}

#[test]
fn rolling_features_are_trailing() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 6, 30).unwrap();
    let prices = synthetic_prices("DIA", start, end);
    let dates: Vec<_> = prices.iter().map(|b| b.date).collect();
    let sentiment = synthetic_sentiment("DIA", &dates);

    let full = merge_price_and_sentiment("DIA", &prices, &sentiment).unwrap();
    let k = 40;
    let truncated = merge_price_and_sentiment("DIA", &prices[..k], &sentiment[..k]).unwrap();

    assert_eq!(truncated.rows(), &full.rows()[..k]);
}

/// The volatility threshold is a percentile of the whole series. Truncating
/// the series can move it. This is a known, accepted exposure separate from
/// the one-day lag; the test pins that the threshold is computed from every
/// row rather than a trailing window.
#[test]
fn volatility_threshold_uses_full_series() {
    use altalpha_core::signals::percentile;

    let series = make_series("TLT");
    let full = percentile(&series.volatility_values(), 50.0).unwrap();
    let mut rows = series.rows().to_vec();
    let n = rows.len();
    for row in rows.iter_mut().skip(n / 2) {
        row.volatility_5d = Some(1.0);
    }
    let shifted = FeatureSeries::new(series.ticker(), rows).unwrap();
    let moved = percentile(&shifted.volatility_values(), 50.0).unwrap();
    assert!(moved > full);
}
