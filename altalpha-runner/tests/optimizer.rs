//! Grid search, ranking, stability and sensitivity.

use altalpha_core::domain::FeatureSeries;
use altalpha_runner::data_loader::synthetic_series;
use altalpha_runner::metrics::MetricsConfig;
use altalpha_runner::stability::{find_stable_regions, parameter_sensitivity};
use altalpha_runner::sweep::{CellResult, GridResults, GridSearch, ParamGrid, ParamRange};
use chrono::NaiveDate;

fn cell(grid: &ParamGrid, i: usize, j: usize, sharpe: f64) -> CellResult {
    CellResult {
        sentiment_threshold: grid.sentiment_thresholds[i],
        volatility_percentile: grid.volatility_percentiles[j],
        sentiment_index: i,
        volatility_index: j,
        sharpe_ratio: sharpe,
        total_return_pct: 0.0,
        max_drawdown_pct: 0.0,
        annual_volatility_pct: 0.0,
        trade_count: 0,
    }
}

fn grid(sentiment: ParamRange, volatility: ParamRange) -> ParamGrid {
    ParamGrid::from_ranges(&sentiment, &volatility, 10_000).unwrap()
}

fn synthetic() -> FeatureSeries {
    synthetic_series(
        "SPY",
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
    )
    .unwrap()
}

// ── Grid construction ──

#[test]
fn grid_values_are_inclusive_and_rounded() {
    let g = grid(ParamRange::new(-0.5, 0.5, 0.1), ParamRange::new(20.0, 80.0, 10.0));
    assert_eq!(g.dims(), (11, 7));
    assert_eq!(g.sentiment_thresholds[0], -0.5);
    assert_eq!(g.sentiment_thresholds[5], 0.0);
    assert_eq!(g.sentiment_thresholds[8], 0.3);
    assert_eq!(g.sentiment_thresholds[10], 0.5);
    assert_eq!(g.volatility_percentiles, vec![20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);
}

#[test]
fn corner_cells_have_three_neighbors() {
    let g = grid(ParamRange::new(0.0, 0.2, 0.1), ParamRange::new(10.0, 30.0, 10.0));
    assert_eq!(g.neighbors(0, 0).len(), 3);
    assert_eq!(g.neighbors(1, 1).len(), 8);
    assert_eq!(g.neighbors(2, 1).len(), 5);
}

// ── Ranking ──

#[test]
fn equal_sharpe_keeps_first_enumerated_cell() {
    let g = grid(ParamRange::new(0.0, 0.1, 0.1), ParamRange::new(40.0, 60.0, 10.0));
    let cells = vec![
        cell(&g, 0, 0, 0.5),
        cell(&g, 0, 1, 1.2),
        cell(&g, 0, 2, 0.9),
        cell(&g, 1, 0, 1.2),
        cell(&g, 1, 1, -0.3),
        cell(&g, 1, 2, 1.2),
    ];
    let results = GridResults::new(g, cells).unwrap();
    let best = results.best().unwrap();
    assert_eq!((best.sentiment_index, best.volatility_index), (0, 1));

    let top: Vec<_> = results
        .top_n(3)
        .iter()
        .map(|c| (c.sentiment_index, c.volatility_index))
        .collect();
    assert_eq!(top, vec![(0, 1), (1, 0), (1, 2)]);
}

#[test]
fn results_are_reordered_into_enumeration_order() {
    let g = grid(ParamRange::new(0.0, 0.1, 0.1), ParamRange::new(50.0, 60.0, 10.0));
    let cells = vec![
        cell(&g, 1, 1, 4.0),
        cell(&g, 0, 0, 1.0),
        cell(&g, 1, 0, 3.0),
        cell(&g, 0, 1, 2.0),
    ];
    let results = GridResults::new(g, cells).unwrap();
    let sharpes: Vec<f64> = results.cells().iter().map(|c| c.sharpe_ratio).collect();
    assert_eq!(sharpes, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(results.cell(1, 0).unwrap().sharpe_ratio, 3.0);
}

#[test]
fn wrong_cell_count_is_rejected() {
    let g = grid(ParamRange::new(0.0, 0.1, 0.1), ParamRange::new(50.0, 50.0, 10.0));
    let only = vec![cell(&g, 0, 0, 1.0)];
    assert!(GridResults::new(g, only).is_err());
}

// ── Stability and sensitivity ──

#[test]
fn stability_penalizes_dispersion() {
    let g = grid(ParamRange::new(0.1, 0.1, 0.1), ParamRange::new(40.0, 60.0, 10.0));
    let cells = vec![cell(&g, 0, 0, 3.0), cell(&g, 0, 1, 0.0), cell(&g, 0, 2, 3.0)];
    let results = GridResults::new(g, cells).unwrap();

    let regions = find_stable_regions(&results, 0.5, 10);
    assert_eq!(regions.len(), 3);

    // Middle: mean 2, population std sqrt(2)
    assert_eq!(regions[0].volatility_percentile, 50.0);
    assert_eq!(regions[0].avg_neighbor_sharpe, 2.0);
    assert_eq!(regions[0].neighbor_std, 1.4142);
    assert_eq!(regions[0].neighbor_count, 2);
    assert_eq!(regions[0].stability_score, 1.2929);

    // Edges tie at 1.5 - 0.75; enumeration order breaks the tie
    assert_eq!(regions[1].volatility_percentile, 40.0);
    assert_eq!(regions[1].stability_score, 0.75);
    assert_eq!(regions[2].volatility_percentile, 60.0);
    assert_eq!(regions[2].neighbor_count, 1);
}

#[test]
fn stability_respects_top_n() {
    let g = grid(ParamRange::new(0.0, 0.4, 0.1), ParamRange::new(10.0, 50.0, 10.0));
    let cells = g
        .coordinates()
        .into_iter()
        .map(|(i, j)| cell(&g, i, j, (i * j) as f64 * 0.1))
        .collect();
    let results = GridResults::new(g, cells).unwrap();
    assert_eq!(find_stable_regions(&results, 0.5, 4).len(), 4);
    assert_eq!(find_stable_regions(&results, 0.5, 100).len(), 25);
}

#[test]
fn uniform_surface_scores_its_sharpe() {
    let g = grid(ParamRange::new(0.0, 0.2, 0.1), ParamRange::new(10.0, 30.0, 10.0));
    let cells = g.coordinates().into_iter().map(|(i, j)| cell(&g, i, j, 0.8)).collect();
    let results = GridResults::new(g, cells).unwrap();
    for region in find_stable_regions(&results, 0.5, 9) {
        assert_eq!(region.stability_score, 0.8);
        assert_eq!(region.neighbor_std, 0.0);
    }
}

#[test]
fn sensitivity_groups_by_each_parameter() {
    let g = grid(ParamRange::new(0.1, 0.1, 0.1), ParamRange::new(40.0, 60.0, 10.0));
    let cells = vec![cell(&g, 0, 0, 3.0), cell(&g, 0, 1, 0.0), cell(&g, 0, 2, 3.0)];
    let results = GridResults::new(g, cells).unwrap();
    let sensitivity = parameter_sensitivity(&results);

    assert_eq!(sensitivity.sentiment_threshold.len(), 1);
    let row = &sensitivity.sentiment_threshold[0];
    assert_eq!(row.value, 0.1);
    assert_eq!(row.mean_sharpe, 2.0);
    assert_eq!(row.std_sharpe, Some(1.7321));
    assert_eq!(row.min_sharpe, 0.0);
    assert_eq!(row.max_sharpe, 3.0);
    assert_eq!(row.count, 3);

    assert_eq!(sensitivity.volatility_percentile.len(), 3);
    assert!(sensitivity
        .volatility_percentile
        .iter()
        .all(|r| r.count == 1 && r.std_sharpe.is_none()));
    assert_eq!(sensitivity.volatility_percentile[1].value, 50.0);
    assert_eq!(sensitivity.volatility_percentile[1].mean_sharpe, 0.0);
}

// ── Search over a real series ──

#[test]
fn parallel_and_sequential_searches_agree() {
    let series = synthetic();
    let g = grid(ParamRange::new(-0.3, 0.3, 0.1), ParamRange::new(20.0, 80.0, 20.0));

    let parallel = GridSearch::new(&series, 0.001, MetricsConfig::default()).run(&g);
    let sequential = GridSearch::new(&series, 0.001, MetricsConfig::default())
        .with_parallelism(false)
        .run(&g);

    assert_eq!(parallel.len(), g.size());
    assert_eq!(parallel, sequential);
}

#[test]
fn search_is_deterministic_across_runs() {
    let series = synthetic();
    let g = grid(ParamRange::new(0.0, 0.2, 0.1), ParamRange::new(30.0, 70.0, 20.0));
    let a = GridSearch::new(&series, 0.001, MetricsConfig::default()).run(&g);
    let b = GridSearch::new(&series, 0.001, MetricsConfig::default()).run(&g);
    assert_eq!(a.best(), b.best());
    assert_eq!(a.cells(), b.cells());
}

#[test]
fn sharpe_is_rounded_to_four_places() {
    let series = synthetic();
    let g = grid(ParamRange::new(0.0, 0.1, 0.1), ParamRange::new(50.0, 50.0, 10.0));
    let results = GridSearch::new(&series, 0.001, MetricsConfig::default()).run(&g);
    for c in results.cells() {
        let scaled = c.sharpe_ratio * 10_000.0;
        assert!((scaled - scaled.round()).abs() < 1e-6);
    }
}
