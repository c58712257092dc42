//! End-of-run trade statistics for the live simulation.

use crate::domain::{SimulationStep, Trade};
use serde::{Deserialize, Serialize};

/// Gross wins over gross losses.
///
/// `Infinite` when there are winning trades and no losses at all. With
/// neither wins nor losses the factor is `Finite(0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProfitFactor {
    Finite(f64),
    Infinite,
}

impl ProfitFactor {
    pub fn from_totals(total_profit: f64, total_loss: f64) -> Self {
        if total_loss > 0.0 {
            Self::Finite(total_profit / total_loss)
        } else if total_profit > 0.0 {
            Self::Infinite
        } else {
            Self::Finite(0.0)
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    pub fn map_finite(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Finite(v) => Self::Finite(f(v)),
            Self::Infinite => Self::Infinite,
        }
    }
}

impl std::fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finite(v) => write!(f, "{v:.2}"),
            Self::Infinite => write!(f, "inf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub trading_days: usize,
    pub total_trades: usize,
    pub winning_trades: usize,
    /// Trades whose pnl rounds to <= 0 at 2 dp.
    pub losing_trades: usize,
    pub win_rate_pct: f64,
    pub avg_win: f64,
    /// Mean pnl of losing trades. Sub-cent gains can leave it slightly above zero.
    pub avg_loss: f64,
    pub profit_factor: ProfitFactor,
    pub total_profit: f64,
    /// Absolute sum of losing-trade pnl.
    pub total_loss: f64,
    pub max_drawdown_pct: f64,
    pub best_trade: Option<f64>,
    pub worst_trade: Option<f64>,
}

impl TradeSummary {
    pub fn from_run(steps: &[SimulationStep], trades: &[Trade]) -> Self {
        let (wins, losses): (Vec<&Trade>, Vec<&Trade>) =
            trades.iter().partition(|t| t.is_winner());

        let total_profit: f64 = wins.iter().map(|t| t.pnl).sum();
        let loss_sum: f64 = losses.iter().map(|t| t.pnl).sum();
        let total_loss = loss_sum.abs();

        let mean = |sum: f64, n: usize| if n > 0 { sum / n as f64 } else { 0.0 };

        let max_drawdown = steps
            .iter()
            .map(|s| s.portfolio.drawdown)
            .fold(0.0_f64, f64::max);

        Self {
            trading_days: steps.len(),
            total_trades: trades.len(),
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate_pct: mean(wins.len() as f64 * 100.0, trades.len()),
            avg_win: mean(total_profit, wins.len()),
            avg_loss: mean(loss_sum, losses.len()),
            profit_factor: ProfitFactor::from_totals(total_profit, total_loss),
            total_profit,
            total_loss,
            max_drawdown_pct: max_drawdown * 100.0,
            best_trade: trades.iter().map(|t| t.pnl).reduce(f64::max),
            worst_trade: trades.iter().map(|t| t.pnl).reduce(f64::min),
        }
    }
}
