//! Sentiment/volatility signal rule.
//!
//! - Long:  sentiment_avg_5d >  sentiment_threshold AND volatility_5d < volatility_threshold
//! - Short: sentiment_avg_5d < -sentiment_threshold
//! - Flat:  otherwise, or whenever either input is missing
//!
//! The rule is a pure function of one row; it never sees portfolio state.

use crate::domain::{FeatureRow, Signal};
use serde::{Deserialize, Serialize};

/// Rule parameters resolved for one run.
///
/// `volatility_threshold` is `None` when the series has no volatility values
/// at all, in which case the Long branch can never fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRule {
    pub sentiment_threshold: f64,
    pub volatility_threshold: Option<f64>,
}

impl SignalRule {
    pub fn new(sentiment_threshold: f64, volatility_threshold: Option<f64>) -> Self {
        Self {
            sentiment_threshold,
            volatility_threshold,
        }
    }

    pub fn evaluate(&self, sentiment_avg_5d: Option<f64>, volatility_5d: Option<f64>) -> Signal {
        generate_signal(
            sentiment_avg_5d,
            volatility_5d,
            self.sentiment_threshold,
            self.volatility_threshold,
        )
    }

    pub fn evaluate_row(&self, row: &FeatureRow) -> Signal {
        self.evaluate(row.sentiment_avg_5d, row.volatility_5d)
    }

    /// Same-day signal for every row, in order.
    pub fn signals(&self, rows: &[FeatureRow]) -> Vec<Signal> {
        rows.iter().map(|row| self.evaluate_row(row)).collect()
    }
}

/// Evaluate the rule for a single day.
pub fn generate_signal(
    sentiment_avg_5d: Option<f64>,
    volatility_5d: Option<f64>,
    sentiment_threshold: f64,
    volatility_threshold: Option<f64>,
) -> Signal {
    let (Some(sentiment), Some(volatility)) = (sentiment_avg_5d, volatility_5d) else {
        return Signal::Flat;
    };

    let calm = volatility_threshold.is_some_and(|threshold| volatility < threshold);
    if sentiment > sentiment_threshold && calm {
        Signal::Long
    } else if sentiment < -sentiment_threshold {
        Signal::Short
    } else {
        Signal::Flat
    }
}

/// Shift a signal series forward one day: the position held on day `t` is
/// the signal emitted on day `t - 1`. Day 0 is always Flat.
pub fn lagged_positions(signals: &[Signal]) -> Vec<Signal> {
    let mut positions = Vec::with_capacity(signals.len());
    if signals.is_empty() {
        return positions;
    }
    positions.push(Signal::Flat);
    positions.extend_from_slice(&signals[..signals.len() - 1]);
    positions
}
