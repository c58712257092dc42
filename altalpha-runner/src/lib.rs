//! AltAlpha Runner: run orchestration on top of `altalpha-core`.
//!
//! This crate provides:
//! - TOML configuration with validated defaults
//! - CSV loading (raw or feature layout) and synthetic fallback data
//! - Performance metrics over daily strategy returns
//! - Parallel parameter grid search with stability and sensitivity analysis
//! - Report shapes for every run type

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod stability;
pub mod sweep;

pub use config::{AltAlphaConfig, ConfigError, OptimizerConfig, SimulationConfig};
pub use data_loader::{
    load_csv, load_series, read_csv, synthetic_series, write_features_csv, DataSource, LoadError,
    LoadedSeries,
};
pub use metrics::{MetricsConfig, PerformanceMetrics};
pub use report::{
    BacktestReport, DatasetInfo, LiveSimulationReport, MetricsReport, OptimizationReport,
    SignalsReport,
};
pub use runner::{
    run_backtest, run_live_simulation, run_metrics, run_optimization, run_signals, RunError,
};
pub use stability::{
    find_stable_regions, parameter_sensitivity, ParameterSensitivity, SensitivityRow, StableRegion,
};
pub use sweep::{CellResult, GridError, GridResults, GridSearch, ParamGrid, ParamRange};
