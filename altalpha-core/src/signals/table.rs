//! Per-day strategy table: inputs, same-day signal and the lagged position.

use super::rule::{lagged_positions, SignalRule};
use crate::domain::{FeatureSeries, Signal};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRow {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(rename = "return")]
    pub daily_return: Option<f64>,
    pub sentiment: Option<f64>,
    pub sentiment_avg_5d: Option<f64>,
    pub volatility_5d: Option<f64>,
    pub signal: Signal,
    /// Exposure actually held on this day (previous day's signal).
    pub position: Signal,
}

/// Evaluate `rule` on every row and attach the lagged position.
pub fn strategy_table(series: &FeatureSeries, rule: &SignalRule) -> Vec<StrategyRow> {
    let signals = rule.signals(series.rows());
    let positions = lagged_positions(&signals);

    series
        .rows()
        .iter()
        .zip(signals)
        .zip(positions)
        .map(|((row, signal), position)| StrategyRow {
            date: row.date,
            close: row.close,
            daily_return: row.daily_return,
            sentiment: row.sentiment,
            sentiment_avg_5d: row.sentiment_avg_5d,
            volatility_5d: row.volatility_5d,
            signal,
            position,
        })
        .collect()
}

/// Count of Long/Short/Flat signals, in that order.
pub fn signal_counts(rows: &[StrategyRow]) -> (usize, usize, usize) {
    rows.iter().fold((0, 0, 0), |(l, s, f), row| match row.signal {
        Signal::Long => (l + 1, s, f),
        Signal::Short => (l, s + 1, f),
        Signal::Flat => (l, s, f + 1),
    })
}
