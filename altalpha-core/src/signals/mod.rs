//! Signal generation: percentile threshold, the daily rule and the strategy table.

pub mod rule;
pub mod table;
pub mod threshold;

pub use rule::{generate_signal, lagged_positions, SignalRule};
pub use table::{signal_counts, strategy_table, StrategyRow};
pub use threshold::{percentile, VolatilityDistribution};

use crate::domain::{FeatureSeries, Signal};

/// Resolve a rule for `series` and evaluate it on every row.
///
/// The volatility threshold is the `volatility_percentile` of the whole
/// series' volatility column.
pub fn signal_series(
    series: &FeatureSeries,
    sentiment_threshold: f64,
    volatility_percentile: f64,
) -> (SignalRule, Vec<Signal>) {
    let threshold = percentile(&series.volatility_values(), volatility_percentile);
    let rule = SignalRule::new(sentiment_threshold, threshold);
    let signals = rule.signals(series.rows());
    (rule, signals)
}
