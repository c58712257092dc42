//! Simulation engines.
//!
//! Two replays of the same signal rule over a `FeatureSeries`:
//! - `backtest`: vectorized, one-day-lagged position times daily return
//! - `live`: stateful day-by-day replay with cash, shares, trades and drawdown

pub mod backtest;
pub mod live;
pub mod summary;

pub use backtest::{run_backtest, BacktestEngine, BacktestRow, BacktestRun};
pub use live::{run_live_simulation, LiveSimulation};
pub use summary::{ProfitFactor, TradeSummary};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters shared by the backtest and the live simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub initial_capital: f64,
    /// Fraction of traded value charged per transaction (0.001 = 0.1%).
    pub transaction_cost: f64,
    pub sentiment_threshold: f64,
    /// Percentile (0–100) of the series' volatility column used as the Long filter.
    pub volatility_percentile: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            transaction_cost: 0.001,
            sentiment_threshold: 0.2,
            volatility_percentile: 50.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("initial_capital must be finite and positive, got {0}")]
    InitialCapital(f64),

    #[error("transaction_cost must be in [0, 1), got {0}")]
    TransactionCost(f64),

    #[error("sentiment_threshold must be finite, got {0}")]
    SentimentThreshold(f64),

    #[error("volatility_percentile must be in [0, 100], got {0}")]
    VolatilityPercentile(f64),
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ParamsError::InitialCapital(self.initial_capital));
        }
        if !(0.0..1.0).contains(&self.transaction_cost) {
            return Err(ParamsError::TransactionCost(self.transaction_cost));
        }
        if !self.sentiment_threshold.is_finite() {
            return Err(ParamsError::SentimentThreshold(self.sentiment_threshold));
        }
        if !(0.0..=100.0).contains(&self.volatility_percentile) {
            return Err(ParamsError::VolatilityPercentile(self.volatility_percentile));
        }
        Ok(())
    }
}
