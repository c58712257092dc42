//! Two-dimensional parameter grid search over one cached feature series.
//!
//! The grid is dense and indexed by integer coordinates
//! `(sentiment_index, volatility_index)`, so neighbor lookups never depend on
//! float equality. Cells are evaluated independently (in parallel by
//! default) and collected in enumeration order before ranking.

use altalpha_core::domain::FeatureSeries;
use altalpha_core::engine::BacktestEngine;
use altalpha_core::features::round_to;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::{MetricsConfig, PerformanceMetrics};

/// Decimal places kept on generated grid values.
const GRID_DECIMALS: u32 = 8;

/// Absorbs float error in `(stop - start) / step` so an on-grid `stop` is kept.
const STEP_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("range bounds must be finite (start {start}, stop {stop}, step {step})")]
    NonFinite { start: f64, stop: f64, step: f64 },

    #[error("step must be positive, got {0}")]
    NonPositiveStep(f64),

    #[error("stop {stop} is below start {start}")]
    Inverted { start: f64, stop: f64 },

    #[error("grid has {cells} cells, above the limit of {max}")]
    TooManyCells { cells: usize, max: usize },

    #[error("expected {expected} cell results, got {found}")]
    CellCountMismatch { expected: usize, found: usize },
}

/// Inclusive range `start..=stop` in increments of `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl ParamRange {
    pub const fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    pub fn validate(&self) -> Result<(), GridError> {
        let Self { start, stop, step } = *self;
        if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
            return Err(GridError::NonFinite { start, stop, step });
        }
        if step <= 0.0 {
            return Err(GridError::NonPositiveStep(step));
        }
        if stop < start {
            return Err(GridError::Inverted { start, stop });
        }
        Ok(())
    }

    /// Number of values: `floor((stop - start) / step) + 1`, so no value
    /// exceeds `stop`. Saturates at `usize::MAX` for absurd ratios.
    pub fn count(&self) -> Result<usize, GridError> {
        self.validate()?;
        let steps = ((self.stop - self.start) / self.step + STEP_EPSILON).floor();
        Ok((steps as usize).saturating_add(1))
    }

    /// `start + i * step` for every index, rounded to 8 dp.
    pub fn values(&self) -> Result<Vec<f64>, GridError> {
        let n = self.count()?;
        Ok((0..n)
            .map(|i| round_to(self.start + i as f64 * self.step, GRID_DECIMALS))
            .collect())
    }
}

/// Dense grid of (sentiment_threshold, volatility_percentile) values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub sentiment_thresholds: Vec<f64>,
    pub volatility_percentiles: Vec<f64>,
}

impl ParamGrid {
    /// Build from two ranges, rejecting grids above `max_cells`.
    pub fn from_ranges(
        sentiment: &ParamRange,
        volatility: &ParamRange,
        max_cells: usize,
    ) -> Result<Self, GridError> {
        let cells = sentiment.count()?.saturating_mul(volatility.count()?);
        if cells > max_cells {
            return Err(GridError::TooManyCells {
                cells,
                max: max_cells,
            });
        }
        Ok(Self {
            sentiment_thresholds: sentiment.values()?,
            volatility_percentiles: volatility.values()?,
        })
    }

    /// Returns the total number of cells in this grid.
    pub fn size(&self) -> usize {
        self.sentiment_thresholds.len() * self.volatility_percentiles.len()
    }

    pub fn dims(&self) -> (usize, usize) {
        (
            self.sentiment_thresholds.len(),
            self.volatility_percentiles.len(),
        )
    }

    /// Flat index of a cell; sentiment is the outer dimension.
    pub fn index(&self, sentiment_index: usize, volatility_index: usize) -> usize {
        sentiment_index * self.volatility_percentiles.len() + volatility_index
    }

    /// All coordinates in enumeration order: ascending sentiment, then
    /// ascending volatility.
    pub fn coordinates(&self) -> Vec<(usize, usize)> {
        let (ns, nv) = self.dims();
        (0..ns)
            .flat_map(|i| (0..nv).map(move |j| (i, j)))
            .collect()
    }

    /// In-grid coordinates within one step in each dimension (diagonals
    /// included), excluding the cell itself.
    pub fn neighbors(&self, sentiment_index: usize, volatility_index: usize) -> Vec<(usize, usize)> {
        let (ns, nv) = self.dims();
        let mut out = Vec::with_capacity(8);
        for di in -1i64..=1 {
            for dj in -1i64..=1 {
                if di == 0 && dj == 0 {
                    continue;
                }
                let i = sentiment_index as i64 + di;
                let j = volatility_index as i64 + dj;
                if i >= 0 && j >= 0 && (i as usize) < ns && (j as usize) < nv {
                    out.push((i as usize, j as usize));
                }
            }
        }
        out
    }
}

/// Outcome of one grid cell, rounded as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellResult {
    pub sentiment_threshold: f64,
    pub volatility_percentile: f64,
    pub sentiment_index: usize,
    pub volatility_index: usize,
    /// 4 dp.
    pub sharpe_ratio: f64,
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub annual_volatility_pct: f64,
    pub trade_count: usize,
}

impl CellResult {
    fn from_metrics(
        grid: &ParamGrid,
        (i, j): (usize, usize),
        metrics: &PerformanceMetrics,
        trade_count: usize,
    ) -> Self {
        Self {
            sentiment_threshold: grid.sentiment_thresholds[i],
            volatility_percentile: grid.volatility_percentiles[j],
            sentiment_index: i,
            volatility_index: j,
            sharpe_ratio: round_to(metrics.sharpe_ratio, 4),
            total_return_pct: round_to(metrics.total_return * 100.0, 2),
            max_drawdown_pct: round_to(metrics.max_drawdown * 100.0, 2),
            annual_volatility_pct: round_to(metrics.annualized_volatility * 100.0, 2),
            trade_count,
        }
    }
}

/// Grid search executor.
///
/// Evaluates every cell of a grid against one series, optionally in parallel.
/// The series is borrowed read-only for the whole search.
pub struct GridSearch<'a> {
    engine: BacktestEngine<'a>,
    transaction_cost: f64,
    metrics: MetricsConfig,
    parallel: bool,
}

impl<'a> GridSearch<'a> {
    pub fn new(series: &'a FeatureSeries, transaction_cost: f64, metrics: MetricsConfig) -> Self {
        Self {
            engine: BacktestEngine::new(series),
            transaction_cost,
            metrics,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn evaluate(&self, grid: &ParamGrid, coords: (usize, usize)) -> CellResult {
        let (i, j) = coords;
        let (returns, trade_count) = self.engine.strategy_returns(
            grid.sentiment_thresholds[i],
            grid.volatility_percentiles[j],
            self.transaction_cost,
        );
        let metrics = PerformanceMetrics::from_returns(&returns, &self.metrics);
        let cell = CellResult::from_metrics(grid, coords, &metrics, trade_count);
        tracing::debug!(
            sentiment_threshold = cell.sentiment_threshold,
            volatility_percentile = cell.volatility_percentile,
            sharpe = cell.sharpe_ratio,
            trades = cell.trade_count,
            "grid cell evaluated"
        );
        cell
    }

    /// Evaluate every cell. Results come back in enumeration order.
    pub fn run(&self, grid: &ParamGrid) -> GridResults {
        let coords = grid.coordinates();

        let cells: Vec<CellResult> = if self.parallel {
            coords
                .par_iter()
                .map(|&c| self.evaluate(grid, c))
                .collect()
        } else {
            coords.iter().map(|&c| self.evaluate(grid, c)).collect()
        };

        GridResults {
            grid: grid.clone(),
            cells,
        }
    }
}

/// Results from a grid search, in enumeration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridResults {
    grid: ParamGrid,
    cells: Vec<CellResult>,
}

impl GridResults {
    /// Assemble results for `grid` from cells in any order.
    pub fn new(grid: ParamGrid, mut cells: Vec<CellResult>) -> Result<Self, GridError> {
        if cells.len() != grid.size() {
            return Err(GridError::CellCountMismatch {
                expected: grid.size(),
                found: cells.len(),
            });
        }
        cells.sort_by_key(|c| grid.index(c.sentiment_index, c.volatility_index));
        Ok(Self { grid, cells })
    }

    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// All cells in enumeration order.
    pub fn cells(&self) -> &[CellResult] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, sentiment_index: usize, volatility_index: usize) -> Option<&CellResult> {
        self.cells
            .get(self.grid.index(sentiment_index, volatility_index))
    }

    /// Cells sorted by Sharpe, descending. The sort is stable, so equal
    /// Sharpe keeps enumeration order and the first-enumerated cell wins.
    pub fn ranked(&self) -> Vec<&CellResult> {
        let mut sorted: Vec<_> = self.cells.iter().collect();
        sorted.sort_by(|a, b| b.sharpe_ratio.total_cmp(&a.sharpe_ratio));
        sorted
    }

    /// Returns the top N cells by Sharpe.
    pub fn top_n(&self, n: usize) -> Vec<&CellResult> {
        self.ranked().into_iter().take(n).collect()
    }

    /// Returns the best cell by Sharpe.
    pub fn best(&self) -> Option<&CellResult> {
        self.ranked().into_iter().next()
    }
}
