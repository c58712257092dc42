//! External report shapes.
//!
//! Engines work at full precision; every number is rounded here, once, at the
//! boundary. Percent fields are already multiplied by 100.

use altalpha_core::domain::{Signal, SimulationStep, Trade};
use altalpha_core::engine::{BacktestRun, LiveSimulation, ProfitFactor, TradeSummary};
use altalpha_core::features::round_to;
use altalpha_core::signals::{signal_counts, StrategyRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data_loader::LoadedSeries;
use crate::metrics::PerformanceMetrics;
use crate::stability::{ParameterSensitivity, StableRegion};
use crate::sweep::CellResult;

/// Provenance shared by every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub ticker: String,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl DatasetInfo {
    pub fn from_loaded(loaded: &LoadedSeries) -> Self {
        Self {
            ticker: loaded.series.ticker().to_string(),
            dataset_hash: loaded.dataset_hash.clone(),
            synthetic: loaded.synthetic,
            rows: loaded.series.len(),
            first_date: loaded.series.first_date(),
            last_date: loaded.series.last_date(),
        }
    }
}

fn pct(fraction: f64) -> f64 {
    round_to(fraction * 100.0, 2)
}

// ─── Signals ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalsReport {
    #[serde(flatten)]
    pub dataset: DatasetInfo,
    pub sentiment_threshold: f64,
    pub volatility_threshold: Option<f64>,
    pub long_days: usize,
    pub short_days: usize,
    pub flat_days: usize,
    pub rows: Vec<StrategyRow>,
}

impl SignalsReport {
    pub fn new(
        dataset: DatasetInfo,
        sentiment_threshold: f64,
        volatility_threshold: Option<f64>,
        rows: Vec<StrategyRow>,
    ) -> Self {
        let (long_days, short_days, flat_days) = signal_counts(&rows);
        Self {
            dataset,
            sentiment_threshold,
            volatility_threshold: volatility_threshold.map(|v| round_to(v, 6)),
            long_days,
            short_days,
            flat_days,
            rows,
        }
    }
}

// ─── Backtest ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReportRow {
    pub date: NaiveDate,
    pub market_return: f64,
    pub strategy_return: f64,
    pub portfolio_value: f64,
    pub position: Signal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    #[serde(flatten)]
    pub dataset: DatasetInfo,
    pub initial_capital: f64,
    pub final_value: f64,
    pub volatility_threshold: Option<f64>,
    pub trade_count: usize,
    pub rows: Vec<BacktestReportRow>,
}

impl BacktestReport {
    pub fn new(dataset: DatasetInfo, run: &BacktestRun) -> Self {
        Self {
            dataset,
            initial_capital: round_to(run.initial_capital, 2),
            final_value: round_to(run.final_value(), 2),
            volatility_threshold: run.rule.volatility_threshold.map(|v| round_to(v, 6)),
            trade_count: run.trade_count,
            rows: run
                .rows
                .iter()
                .map(|r| BacktestReportRow {
                    date: r.date,
                    market_return: round_to(r.market_return, 6),
                    strategy_return: round_to(r.strategy_return, 6),
                    portfolio_value: round_to(r.portfolio_value, 2),
                    position: r.position,
                })
                .collect(),
        }
    }
}

// ─── Metrics ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    pub dataset: DatasetInfo,
    /// Percent.
    pub total_return: f64,
    /// Percent.
    pub annualized_return: f64,
    /// Percent.
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    /// Percent, zero or negative.
    pub max_drawdown: f64,
    pub trading_days: usize,
}

impl MetricsReport {
    pub fn new(dataset: DatasetInfo, metrics: &PerformanceMetrics) -> Self {
        Self {
            dataset,
            total_return: pct(metrics.total_return),
            annualized_return: pct(metrics.annualized_return),
            annualized_volatility: pct(metrics.annualized_volatility),
            sharpe_ratio: round_to(metrics.sharpe_ratio, 3),
            max_drawdown: pct(metrics.max_drawdown),
            trading_days: metrics.trading_days,
        }
    }
}

// ─── Live simulation ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub close: f64,
    pub sentiment_avg_5d: Option<f64>,
    pub volatility_5d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub current: Signal,
    pub shares: f64,
    pub entry_price: Option<f64>,
    pub entry_date: Option<NaiveDate>,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub cash: f64,
    pub market_value: f64,
    pub total_value: f64,
    pub daily_pnl: f64,
    pub daily_pnl_pct: f64,
    pub total_return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskView {
    pub peak_value: f64,
    pub current_drawdown_pct: f64,
}

/// Trade event attached to a step. A reversal carries a close and an open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeEvent {
    Close {
        side: Signal,
        price: f64,
        shares: f64,
        proceeds: f64,
    },
    Open {
        side: Signal,
        price: f64,
        shares: f64,
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepView {
    /// 1-based.
    pub step: usize,
    pub date: NaiveDate,
    pub market_data: MarketData,
    pub signal: Signal,
    pub position: PositionView,
    pub portfolio: PortfolioView,
    pub risk: RiskView,
    pub trade_events: Vec<TradeEvent>,
}

impl StepView {
    fn new(step: &SimulationStep, initial_capital: f64) -> Self {
        let open = step.position.open_trade.as_ref();
        let mut trade_events = Vec::new();
        if let Some(t) = step.transition {
            if let Some(c) = t.closed {
                trade_events.push(TradeEvent::Close {
                    side: t.from,
                    price: round_to(c.price, 2),
                    shares: round_to(c.shares, 4),
                    proceeds: round_to(c.proceeds, 2),
                });
            }
            if let Some(o) = t.opened {
                trade_events.push(TradeEvent::Open {
                    side: o.side,
                    price: round_to(o.price, 2),
                    shares: round_to(o.shares, 4),
                    value: round_to(o.value, 2),
                });
            }
        }

        Self {
            step: step.index + 1,
            date: step.date,
            market_data: MarketData {
                close: round_to(step.close, 2),
                sentiment_avg_5d: step.sentiment_avg_5d.map(|v| round_to(v, 4)),
                volatility_5d: step.volatility_5d.map(|v| round_to(v, 6)),
            },
            signal: step.signal,
            position: PositionView {
                current: step.position.side,
                shares: round_to(step.position.shares, 4),
                entry_price: open.map(|t| round_to(t.entry_price, 2)),
                entry_date: open.map(|t| t.entry_date),
                unrealized_pnl: round_to(step.unrealized_pnl, 2),
                unrealized_pnl_pct: round_to(step.unrealized_pnl_pct, 2),
            },
            portfolio: PortfolioView {
                cash: round_to(step.portfolio.cash, 2),
                market_value: round_to(step.portfolio.market_value, 2),
                total_value: round_to(step.portfolio.total_value, 2),
                daily_pnl: round_to(step.daily_pnl, 2),
                daily_pnl_pct: round_to(step.daily_pnl_pct, 2),
                total_return_pct: pct(step.portfolio.total_value / initial_capital - 1.0),
            },
            risk: RiskView {
                peak_value: round_to(step.portfolio.peak_value, 2),
                current_drawdown_pct: round_to(step.portfolio.drawdown_pct(), 2),
            },
            trade_events,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeView {
    /// 1-based.
    pub trade_id: usize,
    pub side: Signal,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_value: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub exit_value: f64,
    pub shares: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub holding_days: usize,
    pub transaction_costs: f64,
}

impl TradeView {
    fn new(id: usize, t: &Trade) -> Self {
        Self {
            trade_id: id,
            side: t.side,
            entry_date: t.entry_date,
            entry_price: round_to(t.entry_price, 2),
            entry_value: round_to(t.entry_value, 2),
            exit_date: t.exit_date,
            exit_price: round_to(t.exit_price, 2),
            exit_value: round_to(t.exit_value, 2),
            shares: round_to(t.shares, 4),
            profit_loss: round_to(t.pnl, 2),
            profit_loss_pct: round_to(t.pnl_pct, 2),
            holding_days: t.holding_days,
            transaction_costs: round_to(t.transaction_costs(), 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub cumulative_pnl: f64,
    pub cumulative_pnl_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHistoryRow {
    pub date: NaiveDate,
    pub position: Signal,
    pub shares: f64,
    pub market_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryView {
    pub trading_days: usize,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: ProfitFactor,
    pub total_profit: f64,
    pub total_loss: f64,
    pub max_drawdown_pct: f64,
    pub best_trade: Option<f64>,
    pub worst_trade: Option<f64>,
}

impl From<&TradeSummary> for SummaryView {
    fn from(s: &TradeSummary) -> Self {
        Self {
            trading_days: s.trading_days,
            total_trades: s.total_trades,
            winning_trades: s.winning_trades,
            losing_trades: s.losing_trades,
            win_rate_pct: round_to(s.win_rate_pct, 2),
            avg_win: round_to(s.avg_win, 2),
            avg_loss: round_to(s.avg_loss, 2),
            profit_factor: s.profit_factor.map_finite(|v| round_to(v, 2)),
            total_profit: round_to(s.total_profit, 2),
            total_loss: round_to(s.total_loss, 2),
            max_drawdown_pct: round_to(s.max_drawdown_pct, 2),
            best_trade: s.best_trade.map(|v| round_to(v, 2)),
            worst_trade: s.worst_trade.map(|v| round_to(v, 2)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSimulationReport {
    #[serde(flatten)]
    pub dataset: DatasetInfo,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return_pct: f64,
    pub volatility_threshold: Option<f64>,
    pub simulation_states: Vec<StepView>,
    pub completed_trades: Vec<TradeView>,
    pub daily_pnl: Vec<DailyPnl>,
    pub position_history: Vec<PositionHistoryRow>,
    pub summary: SummaryView,
}

impl LiveSimulationReport {
    pub fn new(dataset: DatasetInfo, sim: &LiveSimulation) -> Self {
        let initial = sim.initial_capital;

        let daily_pnl = sim
            .steps
            .iter()
            .map(|s| {
                let cumulative = s.portfolio.total_value - initial;
                DailyPnl {
                    date: s.date,
                    pnl: round_to(s.daily_pnl, 2),
                    pnl_pct: round_to(s.daily_pnl_pct, 2),
                    cumulative_pnl: round_to(cumulative, 2),
                    cumulative_pnl_pct: pct(cumulative / initial),
                }
            })
            .collect();

        let position_history = sim
            .steps
            .iter()
            .map(|s| PositionHistoryRow {
                date: s.date,
                position: s.position.side,
                shares: round_to(s.position.shares, 4),
                market_value: round_to(s.portfolio.market_value, 2),
            })
            .collect();

        Self {
            dataset,
            initial_capital: round_to(initial, 2),
            final_capital: round_to(sim.final_value, 2),
            total_return_pct: round_to(sim.total_return_pct(), 2),
            volatility_threshold: sim.rule.volatility_threshold.map(|v| round_to(v, 6)),
            simulation_states: sim.steps.iter().map(|s| StepView::new(s, initial)).collect(),
            completed_trades: sim
                .trades
                .iter()
                .enumerate()
                .map(|(i, t)| TradeView::new(i + 1, t))
                .collect(),
            daily_pnl,
            position_history,
            summary: SummaryView::from(&sim.summary),
        }
    }
}

// ─── Optimization ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestParameters {
    pub sentiment_threshold: f64,
    pub volatility_percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    #[serde(flatten)]
    pub dataset: DatasetInfo,
    pub best_parameters: BestParameters,
    pub best_sharpe: f64,
    pub best_total_return_pct: f64,
    pub best_max_drawdown_pct: f64,
    #[serde(rename = "top_10")]
    pub top_results: Vec<CellResult>,
    pub stable_regions: Vec<StableRegion>,
    pub parameter_sensitivity: ParameterSensitivity,
    /// Every cell, ranked by Sharpe.
    pub full_results: Vec<CellResult>,
    pub total_combinations: usize,
}
