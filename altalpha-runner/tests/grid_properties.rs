//! Property tests for grid construction and ranking.
//!
//! Uses proptest to verify, over random ranges and random Sharpe grids:
//! 1. Range values ascend from `start` and never pass `stop`
//! 2. Ranking is a stable sort by Sharpe: descending, ties in enumeration order
//! 3. The best cell is the first-enumerated cell with the maximum Sharpe
//! 4. Stable regions return `min(top_n, cells)` entries, scores descending

use altalpha_runner::stability::find_stable_regions;
use altalpha_runner::sweep::{CellResult, GridResults, ParamGrid, ParamRange};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_range() -> impl Strategy<Value = ParamRange> {
    (-5.0..5.0_f64, 0.0..10.0_f64, 0.01..2.0_f64)
        .prop_map(|(start, span, step)| ParamRange::new(start, start + span, step))
}

/// Sharpe values drawn from a small set so ties are common.
fn arb_sharpe() -> impl Strategy<Value = f64> {
    prop::sample::select(vec![-1.0, 0.0, 0.25, 0.5, 1.5])
}

fn arb_grid() -> impl Strategy<Value = (usize, usize, Vec<f64>)> {
    (1usize..6, 1usize..6).prop_flat_map(|(ns, nv)| {
        prop::collection::vec(arb_sharpe(), ns * nv).prop_map(move |s| (ns, nv, s))
    })
}

fn build_results(ns: usize, nv: usize, sharpes: &[f64]) -> GridResults {
    let grid = ParamGrid {
        sentiment_thresholds: (0..ns).map(|i| i as f64 * 0.1).collect(),
        volatility_percentiles: (0..nv).map(|j| 50.0 + j as f64 * 10.0).collect(),
    };
    let mut cells: Vec<CellResult> = grid
        .coordinates()
        .into_iter()
        .zip(sharpes)
        .map(|((i, j), &sharpe)| CellResult {
            sentiment_threshold: grid.sentiment_thresholds[i],
            volatility_percentile: grid.volatility_percentiles[j],
            sentiment_index: i,
            volatility_index: j,
            sharpe_ratio: sharpe,
            total_return_pct: 0.0,
            max_drawdown_pct: 0.0,
            annual_volatility_pct: 0.0,
            trade_count: 0,
        })
        .collect();
    // Arrival order must not matter.
    cells.reverse();
    GridResults::new(grid, cells).unwrap()
}

// ── 1. Range values ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn range_values_stay_within_bounds(range in arb_range()) {
        let values = range.values().unwrap();
        prop_assert!(!values.is_empty());
        prop_assert_eq!(values.len(), range.count().unwrap());
        prop_assert!((values[0] - range.start).abs() < 1e-8);
        for pair in values.windows(2) {
            prop_assert!(pair[1] > pair[0]);
        }
        let last = values[values.len() - 1];
        prop_assert!(last <= range.stop + 1e-8, "{} passes stop {}", last, range.stop);
        // One more step would pass stop.
        prop_assert!(last + range.step > range.stop - 1e-8);
    }
}

// ── 2. Ranking ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn ranking_is_stable_by_sharpe((ns, nv, sharpes) in arb_grid()) {
        let results = build_results(ns, nv, &sharpes);
        let grid = results.grid();
        let ranked = results.ranked();
        prop_assert_eq!(ranked.len(), ns * nv);

        for pair in ranked.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(a.sharpe_ratio >= b.sharpe_ratio);
            if a.sharpe_ratio == b.sharpe_ratio {
                let ia = grid.index(a.sentiment_index, a.volatility_index);
                let ib = grid.index(b.sentiment_index, b.volatility_index);
                prop_assert!(ia < ib, "tie out of enumeration order: {} before {}", ia, ib);
            }
        }
    }

    #[test]
    fn best_is_first_enumerated_maximum((ns, nv, sharpes) in arb_grid()) {
        let results = build_results(ns, nv, &sharpes);
        let max = sharpes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let first = sharpes.iter().position(|&s| s == max).unwrap();

        let best = results.best().unwrap();
        prop_assert_eq!(best.sharpe_ratio, max);
        prop_assert_eq!(results.grid().index(best.sentiment_index, best.volatility_index), first);
    }
}

// ── 3. Stable regions ────────────────────────────────────────────────

proptest! {
    #[test]
    fn stable_regions_are_truncated_and_ordered(
        (ns, nv, sharpes) in arb_grid(),
        top_n in 0usize..40,
        penalty in 0.0..2.0_f64,
    ) {
        let results = build_results(ns, nv, &sharpes);
        let regions = find_stable_regions(&results, penalty, top_n);
        prop_assert_eq!(regions.len(), top_n.min(ns * nv));
        for pair in regions.windows(2) {
            prop_assert!(pair[0].stability_score >= pair[1].stability_score);
        }
        for region in &regions {
            prop_assert!(region.neighbor_count <= 8);
            prop_assert!(region.neighbor_std >= 0.0);
        }
    }
}
