//! SimulationStep: one append-only log entry per simulated day.

use super::portfolio::PortfolioState;
use super::position::PositionState;
use super::signal::Signal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Liquidation leg of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloseFill {
    pub price: f64,
    pub shares: f64,
    /// Proceeds net of the exit cost.
    pub proceeds: f64,
    pub cost: f64,
}

/// Deployment leg of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenFill {
    pub side: Signal,
    pub price: f64,
    pub shares: f64,
    /// Capital placed into shares, net of the entry cost.
    pub value: f64,
    pub cost: f64,
}

/// What happened on a day where the signal differed from the position.
///
/// A reversal (Long to Short or back) carries both legs; they settle on the
/// same day at the same close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Signal,
    pub to: Signal,
    pub closed: Option<CloseFill>,
    pub opened: Option<OpenFill>,
}

/// Full daily snapshot: market inputs, decision, position, account and risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStep {
    /// Zero-based index into the input series.
    pub index: usize,
    pub date: NaiveDate,
    pub close: f64,
    pub sentiment_avg_5d: Option<f64>,
    pub volatility_5d: Option<f64>,
    pub signal: Signal,
    pub position: PositionState,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_pct: f64,
    pub portfolio: PortfolioState,
    /// `total_value(t) - total_value(t-1)`; day 0 compares against initial capital.
    pub daily_pnl: f64,
    pub daily_pnl_pct: f64,
    pub transition: Option<Transition>,
}

impl SimulationStep {
    pub fn closed_trade(&self) -> bool {
        self.transition.is_some_and(|t| t.closed.is_some())
    }
}
