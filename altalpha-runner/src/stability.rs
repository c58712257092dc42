//! Post-processing of grid results: neighborhood stability and
//! per-parameter sensitivity.
//!
//! Stability score of a cell = mean(S) - penalty * std(S), where S is the
//! cell's Sharpe plus the Sharpe of every in-grid neighbor one step away
//! (diagonals included) and std is the population std. High score means a
//! consistently good neighborhood rather than a single lucky point.

use altalpha_core::features::round_to;
use serde::{Deserialize, Serialize};

use crate::metrics::{mean_f64, population_std, std_dev};
use crate::sweep::GridResults;

/// Default weight of neighborhood dispersion in the stability score.
pub const DEFAULT_STABILITY_PENALTY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StableRegion {
    pub sentiment_threshold: f64,
    pub volatility_percentile: f64,
    pub sharpe_ratio: f64,
    pub avg_neighbor_sharpe: f64,
    pub neighbor_std: f64,
    /// In-grid neighbors found (0..=8), excluding the cell itself.
    pub neighbor_count: usize,
    pub stability_score: f64,
}

/// Score every cell and return the `top_n` by stability score, descending.
///
/// Scores are rounded to 4 dp before ranking; the sort is stable, so ties
/// keep enumeration order.
pub fn find_stable_regions(results: &GridResults, penalty: f64, top_n: usize) -> Vec<StableRegion> {
    let grid = results.grid();

    let mut regions: Vec<StableRegion> = results
        .cells()
        .iter()
        .map(|cell| {
            let mut sharpes = vec![cell.sharpe_ratio];
            let neighbors = grid.neighbors(cell.sentiment_index, cell.volatility_index);
            sharpes.extend(
                neighbors
                    .iter()
                    .filter_map(|&(i, j)| results.cell(i, j))
                    .map(|n| n.sharpe_ratio),
            );

            let mean = mean_f64(&sharpes);
            let std = population_std(&sharpes);
            StableRegion {
                sentiment_threshold: cell.sentiment_threshold,
                volatility_percentile: cell.volatility_percentile,
                sharpe_ratio: cell.sharpe_ratio,
                avg_neighbor_sharpe: round_to(mean, 4),
                neighbor_std: round_to(std, 4),
                neighbor_count: sharpes.len() - 1,
                stability_score: round_to(mean - penalty * std, 4),
            }
        })
        .collect();

    regions.sort_by(|a, b| b.stability_score.total_cmp(&a.stability_score));
    regions.truncate(top_n);
    regions
}

/// Sharpe statistics for all cells sharing one parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub value: f64,
    pub mean_sharpe: f64,
    /// Sample std (ddof 1); `None` for a single-cell group.
    pub std_sharpe: Option<f64>,
    pub min_sharpe: f64,
    pub max_sharpe: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSensitivity {
    pub sentiment_threshold: Vec<SensitivityRow>,
    pub volatility_percentile: Vec<SensitivityRow>,
}

/// Group cells by each parameter's value (ascending) and summarize Sharpe.
pub fn parameter_sensitivity(results: &GridResults) -> ParameterSensitivity {
    let grid = results.grid();
    let (ns, nv) = grid.dims();

    let sentiment_threshold = (0..ns)
        .map(|i| {
            let sharpes: Vec<f64> = (0..nv)
                .filter_map(|j| results.cell(i, j))
                .map(|c| c.sharpe_ratio)
                .collect();
            summarize(grid.sentiment_thresholds[i], &sharpes)
        })
        .collect();

    let volatility_percentile = (0..nv)
        .map(|j| {
            let sharpes: Vec<f64> = (0..ns)
                .filter_map(|i| results.cell(i, j))
                .map(|c| c.sharpe_ratio)
                .collect();
            summarize(grid.volatility_percentiles[j], &sharpes)
        })
        .collect();

    ParameterSensitivity {
        sentiment_threshold,
        volatility_percentile,
    }
}

fn summarize(value: f64, sharpes: &[f64]) -> SensitivityRow {
    SensitivityRow {
        value,
        mean_sharpe: round_to(mean_f64(sharpes), 4),
        std_sharpe: (sharpes.len() > 1).then(|| round_to(std_dev(sharpes), 4)),
        min_sharpe: sharpes.iter().copied().fold(f64::INFINITY, f64::min),
        max_sharpe: sharpes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        count: sharpes.len(),
    }
}
