//! PortfolioState: end-of-day account snapshot.

use serde::{Deserialize, Serialize};

/// Account state after a simulated day.
///
/// `total_value == cash + market_value`. `peak_value` never decreases across
/// a run and `drawdown` is a fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash: f64,
    pub market_value: f64,
    pub total_value: f64,
    pub peak_value: f64,
    pub drawdown: f64,
}

impl PortfolioState {
    /// Build a snapshot, advancing the running peak from `previous_peak`.
    pub fn mark(cash: f64, market_value: f64, previous_peak: f64) -> Self {
        let total_value = cash + market_value;
        let peak_value = previous_peak.max(total_value);
        let drawdown = if peak_value > 0.0 {
            ((peak_value - total_value) / peak_value).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            cash,
            market_value,
            total_value,
            peak_value,
            drawdown,
        }
    }

    pub fn drawdown_pct(&self) -> f64 {
        self.drawdown * 100.0
    }
}
