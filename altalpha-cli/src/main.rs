//! AltAlpha CLI: feature export, signals, backtests, live simulation and
//! parameter optimization over one ticker's sentiment/price series.
//!
//! Commands:
//! - `features`: load or generate a series and write the feature CSV
//! - `signals`: per-day signal and lagged position table
//! - `backtest`: vectorized backtest with a portfolio value path
//! - `metrics`: performance metrics of the backtest's strategy returns
//! - `simulate`: stateful day-by-day simulation with trade accounting
//! - `optimize`: grid search with stability and sensitivity analysis
//!
//! Exit codes: 0 success, 1 error, 2 no data for the requested ticker/range.

use altalpha_runner::{
    load_series, run_backtest, run_live_simulation, run_metrics, run_optimization, run_signals,
    write_features_csv, AltAlphaConfig, BacktestReport, DataSource, LiveSimulationReport,
    LoadedSeries, MetricsReport, OptimizationReport, SignalsReport,
};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "altalpha",
    about = "AltAlpha Lab: sentiment and volatility trading research"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load (or generate) a series and write it in the feature CSV layout.
    Features {
        #[command(flatten)]
        data: DataArgs,

        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
    },
    /// Per-day signals and lagged positions.
    Signals(RunArgs),
    /// Vectorized backtest.
    Backtest(RunArgs),
    /// Performance metrics of the backtest.
    Metrics(RunArgs),
    /// Day-by-day live simulation with trades and P&L.
    Simulate(RunArgs),
    /// Grid search over sentiment threshold and volatility percentile.
    Optimize {
        #[command(flatten)]
        run: RunArgs,

        /// Evaluate grid cells on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Number of top results to print.
        #[arg(long)]
        top: Option<usize>,
    },
}

#[derive(Args)]
struct DataArgs {
    /// CSV file: `date,close,sentiment` or the full feature layout.
    #[arg(long, conflicts_with = "synthetic")]
    data: Option<PathBuf>,

    /// Generate a deterministic synthetic series instead of reading a file.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Ticker symbol.
    #[arg(long, default_value = "SPY")]
    ticker: String,

    /// Synthetic start date (YYYY-MM-DD). Defaults to one year ago.
    #[arg(long)]
    start: Option<String>,

    /// Synthetic end date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial capital override.
    #[arg(long)]
    capital: Option<f64>,

    /// Transaction cost override (fraction per position change).
    #[arg(long)]
    cost: Option<f64>,

    /// Sentiment threshold override.
    #[arg(long, allow_hyphen_values = true)]
    sentiment_threshold: Option<f64>,

    /// Volatility percentile override (0-100).
    #[arg(long)]
    volatility_percentile: Option<f64>,

    /// Write the full JSON report here.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match dispatch(cli.command) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::NoData(ticker)) => {
            eprintln!("No data found for {ticker}");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

enum Outcome {
    Done,
    NoData(String),
}

fn dispatch(command: Commands) -> Result<Outcome> {
    match command {
        Commands::Features { data, output } => run_features_cmd(&data, &output),
        Commands::Signals(args) => {
            let (loaded, config) = prepare(&args)?;
            finish(&args, run_signals(&loaded, &config)?, print_signals, &loaded)
        }
        Commands::Backtest(args) => {
            let (loaded, config) = prepare(&args)?;
            finish(&args, run_backtest(&loaded, &config)?, print_backtest, &loaded)
        }
        Commands::Metrics(args) => {
            let (loaded, config) = prepare(&args)?;
            finish(&args, run_metrics(&loaded, &config)?, print_metrics, &loaded)
        }
        Commands::Simulate(args) => {
            let (loaded, config) = prepare(&args)?;
            finish(&args, run_live_simulation(&loaded, &config)?, print_simulation, &loaded)
        }
        Commands::Optimize {
            run,
            sequential,
            top,
        } => {
            let (loaded, mut config) = prepare(&run)?;
            if sequential {
                config.optimizer.parallel = false;
            }
            if let Some(n) = top {
                config.optimizer.top_n = n;
            }
            finish(&run, run_optimization(&loaded, &config)?, print_optimization, &loaded)
        }
    }
}

fn run_features_cmd(data: &DataArgs, output: &Path) -> Result<Outcome> {
    let loaded = load(data)?;
    if loaded.series.is_empty() {
        return Ok(Outcome::NoData(data.ticker.to_uppercase()));
    }
    write_features_csv(output, &loaded.series)?;
    println!(
        "Wrote {} rows for {} to {}",
        loaded.series.len(),
        loaded.series.ticker(),
        output.display()
    );
    if loaded.synthetic {
        println!("WARNING: SYNTHETIC data");
    }
    Ok(Outcome::Done)
}

fn prepare(args: &RunArgs) -> Result<(LoadedSeries, AltAlphaConfig)> {
    let mut config = match &args.config {
        Some(path) => AltAlphaConfig::from_file(path)?,
        None => AltAlphaConfig::default(),
    };
    let sim = &mut config.simulation;
    if let Some(v) = args.capital {
        sim.initial_capital = v;
    }
    if let Some(v) = args.cost {
        sim.transaction_cost = v;
    }
    if let Some(v) = args.sentiment_threshold {
        sim.sentiment_threshold = v;
    }
    if let Some(v) = args.volatility_percentile {
        sim.volatility_percentile = v;
    }
    config.validate()?;
    tracing::debug!(?config, "resolved configuration");

    let loaded = load(&args.data)?;
    Ok((loaded, config))
}

fn load(args: &DataArgs) -> Result<LoadedSeries> {
    let source = match (&args.data, args.synthetic) {
        (Some(path), false) => DataSource::Csv(path.clone()),
        (None, true) => {
            let end = parse_date(args.end.as_deref())?
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            let start = parse_date(args.start.as_deref())?
                .unwrap_or_else(|| end - chrono::Duration::days(365));
            DataSource::Synthetic { start, end }
        }
        (Some(_), true) => bail!("--data and --synthetic are mutually exclusive"),
        (None, false) => bail!("one of --data or --synthetic is required"),
    };
    Ok(load_series(&source, &args.ticker)?)
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
        })
        .transpose()
}

fn finish<R: Serialize>(
    args: &RunArgs,
    report: Option<R>,
    print: fn(&R),
    loaded: &LoadedSeries,
) -> Result<Outcome> {
    let Some(report) = report else {
        return Ok(Outcome::NoData(loaded.series.ticker().to_string()));
    };
    print(&report);
    if loaded.synthetic {
        println!("WARNING: Results based on SYNTHETIC data");
        println!();
    }
    if let Some(path) = &args.output {
        write_json(path, &report)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(Outcome::Done)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn print_period(ticker: &str, first: Option<NaiveDate>, last: Option<NaiveDate>, rows: usize) {
    println!("Ticker:         {ticker}");
    if let (Some(first), Some(last)) = (first, last) {
        println!("Period:         {first} to {last}");
    }
    println!("Days:           {rows}");
}

fn print_signals(report: &SignalsReport) {
    let d = &report.dataset;
    println!();
    println!("=== Signals ===");
    print_period(&d.ticker, d.first_date, d.last_date, d.rows);
    println!("Sentiment thr:  {:.2}", report.sentiment_threshold);
    match report.volatility_threshold {
        Some(v) => println!("Volatility thr: {v:.6}"),
        None => println!("Volatility thr: n/a (no volatility values)"),
    }
    println!("Long days:      {}", report.long_days);
    println!("Short days:     {}", report.short_days);
    println!("Flat days:      {}", report.flat_days);
    println!();
}

fn print_backtest(report: &BacktestReport) {
    let d = &report.dataset;
    println!();
    println!("=== Backtest ===");
    print_period(&d.ticker, d.first_date, d.last_date, d.rows);
    println!("Initial:        {:.2}", report.initial_capital);
    println!("Final:          {:.2}", report.final_value);
    println!("Position chg:   {}", report.trade_count);
    println!();
}

fn print_metrics(report: &MetricsReport) {
    let d = &report.dataset;
    println!();
    println!("=== Performance ===");
    print_period(&d.ticker, d.first_date, d.last_date, d.rows);
    println!("Total Return:   {:.2}%", report.total_return);
    println!("Annual Return:  {:.2}%", report.annualized_return);
    println!("Annual Vol:     {:.2}%", report.annualized_volatility);
    println!("Sharpe:         {:.3}", report.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", report.max_drawdown);
    println!();
}

fn print_simulation(report: &LiveSimulationReport) {
    let d = &report.dataset;
    let s = &report.summary;
    println!();
    println!("=== Live Simulation ===");
    print_period(&d.ticker, d.first_date, d.last_date, d.rows);
    println!("Initial:        {:.2}", report.initial_capital);
    println!("Final:          {:.2}", report.final_capital);
    println!("Total Return:   {:.2}%", report.total_return_pct);
    println!();
    println!("--- Trades ---");
    println!("Trades:         {}", s.total_trades);
    println!("Win Rate:       {:.1}%", s.win_rate_pct);
    println!("Avg Win:        {:.2}", s.avg_win);
    println!("Avg Loss:       {:.2}", s.avg_loss);
    println!("Profit Factor:  {}", s.profit_factor);
    println!("Max Drawdown:   {:.2}%", s.max_drawdown_pct);
    if let (Some(best), Some(worst)) = (s.best_trade, s.worst_trade) {
        println!("Best / Worst:   {best:.2} / {worst:.2}");
    }
    println!();
}

fn print_optimization(report: &OptimizationReport) {
    let d = &report.dataset;
    println!();
    println!("=== Optimization ===");
    print_period(&d.ticker, d.first_date, d.last_date, d.rows);
    println!("Combinations:   {}", report.total_combinations);
    println!(
        "Best:           sentiment {:.2}, percentile {:.0}",
        report.best_parameters.sentiment_threshold, report.best_parameters.volatility_percentile
    );
    println!("Best Sharpe:    {:.4}", report.best_sharpe);
    println!("Best Return:    {:.2}%", report.best_total_return_pct);
    println!("Best Drawdown:  {:.2}%", report.best_max_drawdown_pct);
    println!();
    println!("--- Top results ---");
    for (rank, cell) in report.top_results.iter().enumerate() {
        println!(
            "{:>3}. sent {:>5.2}  pct {:>3.0}  sharpe {:>7.4}  ret {:>7.2}%  dd {:>7.2}%",
            rank + 1,
            cell.sentiment_threshold,
            cell.volatility_percentile,
            cell.sharpe_ratio,
            cell.total_return_pct,
            cell.max_drawdown_pct
        );
    }
    if !report.stable_regions.is_empty() {
        println!();
        println!("--- Stable regions ---");
        for region in &report.stable_regions {
            println!(
                "     sent {:>5.2}  pct {:>3.0}  score {:>7.4}  neighbors {}",
                region.sentiment_threshold,
                region.volatility_percentile,
                region.stability_score,
                region.neighbor_count
            );
        }
    }
    println!();
}
