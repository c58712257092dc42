//! Vectorized backtest.
//!
//! `position[t] = signal[t-1]` (day 0 is Flat), then
//! `strategy_return[t] = exposure(position[t]) * return[t] - cost * [position changed at t]`
//! and `portfolio_value[t] = initial_capital * prod(1 + strategy_return[..=t])`.

use super::SimulationParams;
use crate::domain::{FeatureSeries, Signal};
use crate::signals::{lagged_positions, SignalRule, VolatilityDistribution};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRow {
    pub date: NaiveDate,
    pub market_return: f64,
    pub strategy_return: f64,
    pub portfolio_value: f64,
    /// Same-day signal (acted on tomorrow).
    pub signal: Signal,
    /// Position held today.
    pub position: Signal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub rule: SignalRule,
    pub initial_capital: f64,
    pub rows: Vec<BacktestRow>,
    /// Days on which the held position changed.
    pub trade_count: usize,
}

impl BacktestRun {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn strategy_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.strategy_return).collect()
    }

    pub fn market_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.market_return).collect()
    }

    pub fn final_value(&self) -> f64 {
        self.rows
            .last()
            .map_or(self.initial_capital, |r| r.portfolio_value)
    }
}

/// Backtester bound to one series.
///
/// Sorts the volatility column and extracts returns once, so repeated runs
/// over different parameters (grid search) only pay for the rule and the
/// running product.
#[derive(Debug, Clone)]
pub struct BacktestEngine<'a> {
    series: &'a FeatureSeries,
    distribution: VolatilityDistribution,
    returns: Vec<f64>,
}

impl<'a> BacktestEngine<'a> {
    pub fn new(series: &'a FeatureSeries) -> Self {
        Self {
            series,
            distribution: VolatilityDistribution::new(series.volatility_values()),
            returns: series.rows().iter().map(|r| r.return_or_zero()).collect(),
        }
    }

    pub fn rule(&self, sentiment_threshold: f64, volatility_percentile: f64) -> SignalRule {
        SignalRule::new(
            sentiment_threshold,
            self.distribution.threshold(volatility_percentile),
        )
    }

    /// Daily strategy returns and position-change count, without building rows.
    pub fn strategy_returns(
        &self,
        sentiment_threshold: f64,
        volatility_percentile: f64,
        transaction_cost: f64,
    ) -> (Vec<f64>, usize) {
        let rule = self.rule(sentiment_threshold, volatility_percentile);
        let positions = lagged_positions(&rule.signals(self.series.rows()));
        apply_positions(&positions, &self.returns, transaction_cost)
    }

    pub fn run(&self, params: &SimulationParams) -> BacktestRun {
        let rule = self.rule(params.sentiment_threshold, params.volatility_percentile);
        self.run_rule(rule, params.initial_capital, params.transaction_cost)
    }

    /// Run with an already-resolved rule (explicit volatility threshold).
    pub fn run_rule(
        &self,
        rule: SignalRule,
        initial_capital: f64,
        transaction_cost: f64,
    ) -> BacktestRun {
        let signals = rule.signals(self.series.rows());
        let positions = lagged_positions(&signals);
        let (strategy, trade_count) = apply_positions(&positions, &self.returns, transaction_cost);

        let mut value = initial_capital;
        let rows = self
            .series
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                value *= 1.0 + strategy[i];
                BacktestRow {
                    date: row.date,
                    market_return: self.returns[i],
                    strategy_return: strategy[i],
                    portfolio_value: value,
                    signal: signals[i],
                    position: positions[i],
                }
            })
            .collect();

        BacktestRun {
            rule,
            initial_capital,
            rows,
            trade_count,
        }
    }
}

/// Convenience wrapper for a single run.
pub fn run_backtest(series: &FeatureSeries, params: &SimulationParams) -> BacktestRun {
    BacktestEngine::new(series).run(params)
}

fn apply_positions(positions: &[Signal], returns: &[f64], cost: f64) -> (Vec<f64>, usize) {
    let mut previous = Signal::Flat;
    let mut changes = 0;
    let strategy = positions
        .iter()
        .zip(returns)
        .map(|(&position, &ret)| {
            let changed = position != previous;
            previous = position;
            let mut r = f64::from(position.exposure()) * ret;
            if changed {
                changes += 1;
                r -= cost;
            }
            r
        })
        .collect();
    (strategy, changes)
}
