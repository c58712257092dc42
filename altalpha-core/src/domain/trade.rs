//! Trade: a completed round trip, written once when the position closes.

use super::signal::Signal;
use crate::features::round_to;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Signal,

    // ── Entry ──
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    /// Net of entry cost.
    pub entry_value: f64,
    pub entry_cost: f64,

    // ── Exit ──
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    /// Net of exit cost.
    pub exit_value: f64,
    pub exit_cost: f64,

    pub shares: f64,

    // ── PnL ──
    pub pnl: f64,
    pub pnl_pct: f64,

    /// Simulated days from the entry day up to (not including) the exit day.
    pub holding_days: usize,
}

impl Trade {
    /// A win is a pnl that stays positive at cent precision; anything that
    /// reports as 0.00 or below is a loss.
    pub fn is_winner(&self) -> bool {
        round_to(self.pnl, 2) > 0.0
    }

    pub fn transaction_costs(&self) -> f64 {
        self.entry_cost + self.exit_cost
    }
}
