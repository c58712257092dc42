use super::signal::Signal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reference to the trade currently held, kept until the position closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenTrade {
    pub side: Signal,
    /// Index of the simulation step on which the trade was opened.
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    /// Capital deployed into shares, already net of the entry cost.
    pub entry_value: f64,
    pub entry_cost: f64,
    pub shares: f64,
}

impl OpenTrade {
    /// Mark-to-market pnl against the net entry value.
    pub fn unrealized_pnl(&self, close: f64) -> f64 {
        self.shares * close - self.entry_value
    }

    pub fn unrealized_pnl_pct(&self, close: f64) -> f64 {
        if self.entry_value > 0.0 {
            self.unrealized_pnl(close) / self.entry_value * 100.0
        } else {
            0.0
        }
    }
}

/// Position held at the end of a simulated day.
///
/// `shares > 0` exactly when `side` is not Flat; the account is either fully
/// invested or fully in cash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub side: Signal,
    pub shares: f64,
    pub open_trade: Option<OpenTrade>,
}

impl PositionState {
    pub fn market_value(&self, close: f64) -> f64 {
        if self.shares > 0.0 {
            self.shares * close
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrealized_pnl_against_net_entry() {
        let trade = OpenTrade {
            side: Signal::Long,
            entry_index: 0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            entry_price: 100.0,
            entry_value: 990.0,
            entry_cost: 10.0,
            shares: 9.9,
        };
        assert!((trade.unrealized_pnl(110.0) - 99.0).abs() < 1e-9);
        assert!((trade.unrealized_pnl_pct(110.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn flat_position_has_no_market_value() {
        let flat = PositionState {
            side: Signal::Flat,
            shares: 0.0,
            open_trade: None,
        };
        assert_eq!(flat.market_value(100.0), 0.0);
    }
}
