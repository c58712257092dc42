//! Performance metrics: pure functions over a daily strategy-return series.
//!
//! Every metric is a pure function: returns in, scalar out. Fractions
//! throughout; conversion to percent and rounding happen in `report`.

use serde::{Deserialize, Serialize};

/// Constants used to annualize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    pub risk_free_rate: f64,
    pub trading_days: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            trading_days: 252,
        }
    }
}

/// Aggregate performance of one return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    /// Zero or negative fraction.
    pub max_drawdown: f64,
    pub trading_days: usize,
}

impl PerformanceMetrics {
    pub fn from_returns(returns: &[f64], config: &MetricsConfig) -> Self {
        let total = total_return(returns);
        let annualized = annualized_return(total, returns.len(), config.trading_days);
        let volatility = annualized_volatility(returns, config.trading_days);
        Self {
            total_return: total,
            annualized_return: annualized,
            annualized_volatility: volatility,
            sharpe_ratio: sharpe_ratio(annualized, volatility, config.risk_free_rate),
            max_drawdown: max_drawdown(&equity_path(returns, 1.0)),
            trading_days: returns.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Compounded return: prod(1 + r) - 1.
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// (1 + total)^(trading_days / n) - 1.
///
/// Zero for an empty series. A wiped-out or negative equity (1 + total <= 0)
/// annualizes to -1.
pub fn annualized_return(total_return: f64, n: usize, trading_days: u32) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(f64::from(trading_days) / n as f64) - 1.0
}

/// Sample standard deviation (ddof 1) scaled by sqrt(trading_days).
///
/// Zero with fewer than two observations.
pub fn annualized_volatility(returns: &[f64], trading_days: u32) -> f64 {
    std_dev(returns) * f64::from(trading_days).sqrt()
}

/// (annualized_return - risk_free_rate) / annualized_volatility, or 0 when
/// volatility is 0.
pub fn sharpe_ratio(annualized_return: f64, annualized_volatility: f64, risk_free_rate: f64) -> f64 {
    if annualized_volatility == 0.0 || !annualized_volatility.is_finite() {
        return 0.0;
    }
    (annualized_return - risk_free_rate) / annualized_volatility
}

/// Value path `initial * prod(1 + r)` after each day.
pub fn equity_path(returns: &[f64], initial: f64) -> Vec<f64> {
    let mut value = initial;
    returns
        .iter()
        .map(|r| {
            value *= 1.0 + r;
            value
        })
        .collect()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if the path never falls below its running maximum.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (v - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Population standard deviation (ddof 0).
pub(crate) fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
