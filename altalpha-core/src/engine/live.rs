//! Day-by-day live simulation.
//!
//! A single forward pass over the series threads a fresh `SimState` through
//! every row. Whenever today's signal differs from the held side, the
//! position is liquidated at today's close (if any) and the full cash
//! balance is redeployed at the same close (if the new side is not Flat).
//! Each row yields exactly one `SimulationStep`.

use super::summary::TradeSummary;
use super::SimulationParams;
use crate::domain::{
    CloseFill, FeatureRow, FeatureSeries, OpenFill, OpenTrade, PortfolioState, PositionState,
    Signal, SimulationStep, Trade, Transition,
};
use crate::signals::percentile;
use crate::signals::SignalRule;
use serde::{Deserialize, Serialize};

/// Result of one live simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSimulation {
    pub ticker: String,
    pub rule: SignalRule,
    pub initial_capital: f64,
    pub final_value: f64,
    pub steps: Vec<SimulationStep>,
    pub trades: Vec<Trade>,
    pub summary: TradeSummary,
}

impl LiveSimulation {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_return_pct(&self) -> f64 {
        (self.final_value / self.initial_capital - 1.0) * 100.0
    }
}

/// Mutable account state for one run. Never shared between runs.
struct SimState {
    side: Signal,
    cash: f64,
    shares: f64,
    peak: f64,
    previous_value: f64,
    open_trade: Option<OpenTrade>,
}

impl SimState {
    fn new(initial_capital: f64) -> Self {
        Self {
            side: Signal::Flat,
            cash: initial_capital,
            shares: 0.0,
            peak: initial_capital,
            previous_value: initial_capital,
            open_trade: None,
        }
    }

    /// Sell every share at `close`; the proceeds net of cost become cash.
    fn close_position(
        &mut self,
        index: usize,
        row: &FeatureRow,
        cost_rate: f64,
    ) -> (CloseFill, Option<Trade>) {
        let gross = self.shares * row.close;
        let cost = gross * cost_rate;
        let proceeds = gross - cost;
        let fill = CloseFill {
            price: row.close,
            shares: self.shares,
            proceeds,
            cost,
        };

        let trade = self.open_trade.take().map(|open| {
            let pnl = proceeds - open.entry_value;
            Trade {
                side: open.side,
                entry_date: open.entry_date,
                entry_price: open.entry_price,
                entry_value: open.entry_value,
                entry_cost: open.entry_cost,
                exit_date: row.date,
                exit_price: row.close,
                exit_value: proceeds,
                exit_cost: cost,
                shares: open.shares,
                pnl,
                pnl_pct: if open.entry_value > 0.0 {
                    pnl / open.entry_value * 100.0
                } else {
                    0.0
                },
                holding_days: index - open.entry_index,
            }
        });

        self.cash = proceeds;
        self.shares = 0.0;
        self.side = Signal::Flat;
        (fill, trade)
    }

    /// Put all cash, net of cost, into shares at `close`.
    fn open_position(
        &mut self,
        index: usize,
        row: &FeatureRow,
        side: Signal,
        cost_rate: f64,
    ) -> OpenFill {
        let cost = self.cash * cost_rate;
        let value = self.cash - cost;
        let shares = value / row.close;

        self.open_trade = Some(OpenTrade {
            side,
            entry_index: index,
            entry_date: row.date,
            entry_price: row.close,
            entry_value: value,
            entry_cost: cost,
            shares,
        });
        self.cash = 0.0;
        self.shares = shares;
        self.side = side;

        OpenFill {
            side,
            price: row.close,
            shares,
            value,
            cost,
        }
    }

    fn position(&self) -> PositionState {
        PositionState {
            side: self.side,
            shares: self.shares,
            open_trade: self.open_trade.clone(),
        }
    }
}

/// Replay `series` day by day under `params`.
///
/// An empty series produces an empty simulation with `final_value` equal to
/// the initial capital.
pub fn run_live_simulation(series: &FeatureSeries, params: &SimulationParams) -> LiveSimulation {
    let rule = SignalRule::new(
        params.sentiment_threshold,
        percentile(&series.volatility_values(), params.volatility_percentile),
    );

    let mut state = SimState::new(params.initial_capital);
    let mut steps = Vec::with_capacity(series.len());
    let mut trades = Vec::new();

    for (index, row) in series.rows().iter().enumerate() {
        let signal = rule.evaluate_row(row);

        let transition = (signal != state.side).then(|| {
            let from = state.side;
            let closed = (!from.is_flat()).then(|| {
                let (fill, trade) = state.close_position(index, row, params.transaction_cost);
                if let Some(trade) = trade {
                    trades.push(trade);
                }
                fill
            });
            let opened = (!signal.is_flat())
                .then(|| state.open_position(index, row, signal, params.transaction_cost));
            Transition {
                from,
                to: signal,
                closed,
                opened,
            }
        });

        let position = state.position();
        let portfolio = PortfolioState::mark(state.cash, position.market_value(row.close), state.peak);
        state.peak = portfolio.peak_value;

        let daily_pnl = portfolio.total_value - state.previous_value;
        let daily_pnl_pct = if state.previous_value > 0.0 {
            daily_pnl / state.previous_value * 100.0
        } else {
            0.0
        };
        state.previous_value = portfolio.total_value;

        let (unrealized_pnl, unrealized_pnl_pct) = state
            .open_trade
            .as_ref()
            .map_or((0.0, 0.0), |t| {
                (t.unrealized_pnl(row.close), t.unrealized_pnl_pct(row.close))
            });

        debug_assert!(
            (state.shares > 0.0) == !state.side.is_flat(),
            "shares and side out of sync on {}",
            row.date
        );
        debug_assert!(
            state.side.is_flat() || state.cash == 0.0,
            "cash left over while invested on {}",
            row.date
        );

        steps.push(SimulationStep {
            index,
            date: row.date,
            close: row.close,
            sentiment_avg_5d: row.sentiment_avg_5d,
            volatility_5d: row.volatility_5d,
            signal,
            position,
            unrealized_pnl,
            unrealized_pnl_pct,
            portfolio,
            daily_pnl,
            daily_pnl_pct,
            transition,
        });
    }

    let final_value = steps
        .last()
        .map_or(params.initial_capital, |s| s.portfolio.total_value);
    let summary = TradeSummary::from_run(&steps, &trades);

    tracing::debug!(
        ticker = series.ticker(),
        days = steps.len(),
        trades = trades.len(),
        final_value,
        "live simulation finished"
    );

    LiveSimulation {
        ticker: series.ticker().to_string(),
        rule,
        initial_capital: params.initial_capital,
        final_value,
        steps,
        trades,
        summary,
    }
}
