//! Run entry points: wire together loading, engines, metrics and reports.
//!
//! Every entry point takes an already-loaded series plus the configuration,
//! validates the configuration, and returns `Ok(None)` when the series is
//! shorter than `simulation.min_rows`. Callers decide how to surface "no
//! data"; the CLI maps it to a distinct exit code.

use altalpha_core::engine;
use altalpha_core::signals::{signal_series, strategy_table};
use thiserror::Error;

use crate::config::{AltAlphaConfig, ConfigError};
use crate::data_loader::{LoadError, LoadedSeries};
use crate::metrics::PerformanceMetrics;
use crate::report::{
    BacktestReport, BestParameters, DatasetInfo, LiveSimulationReport, MetricsReport,
    OptimizationReport, SignalsReport,
};
use crate::stability::{find_stable_regions, parameter_sensitivity};
use crate::sweep::{GridError, GridSearch};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("grid error: {0}")]
    Grid(#[from] GridError),
}

/// Returns the dataset info when the series is long enough to run on.
fn usable(loaded: &LoadedSeries, config: &AltAlphaConfig) -> Result<Option<DatasetInfo>, RunError> {
    config.validate()?;
    let rows = loaded.series.len();
    if rows < config.simulation.min_rows {
        tracing::warn!(
            ticker = loaded.series.ticker(),
            rows,
            min_rows = config.simulation.min_rows,
            "insufficient data"
        );
        return Ok(None);
    }
    Ok(Some(DatasetInfo::from_loaded(loaded)))
}

/// Per-day signals and lagged positions.
pub fn run_signals(
    loaded: &LoadedSeries,
    config: &AltAlphaConfig,
) -> Result<Option<SignalsReport>, RunError> {
    let Some(dataset) = usable(loaded, config)? else {
        return Ok(None);
    };
    let sim = &config.simulation;
    let (rule, _) = signal_series(&loaded.series, sim.sentiment_threshold, sim.volatility_percentile);
    let rows = strategy_table(&loaded.series, &rule);
    let report = SignalsReport::new(dataset, rule.sentiment_threshold, rule.volatility_threshold, rows);

    tracing::info!(
        ticker = %report.dataset.ticker,
        long = report.long_days,
        short = report.short_days,
        flat = report.flat_days,
        "signals generated"
    );
    Ok(Some(report))
}

/// Vectorized backtest over the configured parameters.
pub fn run_backtest(
    loaded: &LoadedSeries,
    config: &AltAlphaConfig,
) -> Result<Option<BacktestReport>, RunError> {
    let Some(dataset) = usable(loaded, config)? else {
        return Ok(None);
    };
    let run = engine::run_backtest(&loaded.series, &config.simulation.params());
    let report = BacktestReport::new(dataset, &run);

    tracing::info!(
        ticker = %report.dataset.ticker,
        final_value = report.final_value,
        trades = report.trade_count,
        "backtest complete"
    );
    Ok(Some(report))
}

/// Backtest followed by performance metrics over its strategy returns.
pub fn run_metrics(
    loaded: &LoadedSeries,
    config: &AltAlphaConfig,
) -> Result<Option<MetricsReport>, RunError> {
    let Some(dataset) = usable(loaded, config)? else {
        return Ok(None);
    };
    let run = engine::run_backtest(&loaded.series, &config.simulation.params());
    let metrics = PerformanceMetrics::from_returns(&run.strategy_returns(), &config.metrics);
    let report = MetricsReport::new(dataset, &metrics);

    tracing::info!(
        ticker = %report.dataset.ticker,
        total_return_pct = report.total_return,
        sharpe = report.sharpe_ratio,
        max_drawdown_pct = report.max_drawdown,
        "metrics computed"
    );
    Ok(Some(report))
}

/// Stateful day-by-day simulation with trade accounting.
pub fn run_live_simulation(
    loaded: &LoadedSeries,
    config: &AltAlphaConfig,
) -> Result<Option<LiveSimulationReport>, RunError> {
    let Some(dataset) = usable(loaded, config)? else {
        return Ok(None);
    };
    let sim = engine::run_live_simulation(&loaded.series, &config.simulation.params());
    let report = LiveSimulationReport::new(dataset, &sim);

    tracing::info!(
        ticker = %report.dataset.ticker,
        final_capital = report.final_capital,
        total_return_pct = report.total_return_pct,
        trades = report.summary.total_trades,
        "live simulation complete"
    );
    Ok(Some(report))
}

/// Grid search over (sentiment threshold, volatility percentile), followed
/// by stability and sensitivity analysis.
pub fn run_optimization(
    loaded: &LoadedSeries,
    config: &AltAlphaConfig,
) -> Result<Option<OptimizationReport>, RunError> {
    let Some(dataset) = usable(loaded, config)? else {
        return Ok(None);
    };
    let opt = &config.optimizer;
    let grid = opt.grid()?;
    tracing::info!(
        ticker = %dataset.ticker,
        cells = grid.size(),
        parallel = opt.parallel,
        "starting grid search"
    );

    let results = GridSearch::new(&loaded.series, config.simulation.transaction_cost, config.metrics)
        .with_parallelism(opt.parallel)
        .run(&grid);

    let ranked: Vec<_> = results.ranked().into_iter().cloned().collect();
    let Some(best) = ranked.first().cloned() else {
        return Err(GridError::CellCountMismatch {
            expected: grid.size(),
            found: 0,
        }
        .into());
    };

    let report = OptimizationReport {
        dataset,
        best_parameters: BestParameters {
            sentiment_threshold: best.sentiment_threshold,
            volatility_percentile: best.volatility_percentile,
        },
        best_sharpe: best.sharpe_ratio,
        best_total_return_pct: best.total_return_pct,
        best_max_drawdown_pct: best.max_drawdown_pct,
        top_results: ranked.iter().take(opt.top_n).cloned().collect(),
        stable_regions: find_stable_regions(&results, opt.stability_penalty, opt.stable_top_n),
        parameter_sensitivity: parameter_sensitivity(&results),
        total_combinations: results.len(),
        full_results: ranked,
    };

    tracing::info!(
        ticker = %report.dataset.ticker,
        best_sentiment = report.best_parameters.sentiment_threshold,
        best_percentile = report.best_parameters.volatility_percentile,
        best_sharpe = report.best_sharpe,
        "grid search complete"
    );
    Ok(Some(report))
}
