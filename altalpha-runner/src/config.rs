//! TOML run configuration.
//!
//! Every field has a default, so an empty document (or no file at all) is a
//! valid configuration:
//!
//! ```toml
//! [simulation]
//! initial_capital = 10000.0
//! transaction_cost = 0.001
//! sentiment_threshold = 0.2
//! volatility_percentile = 50.0
//! min_rows = 1
//!
//! [metrics]
//! risk_free_rate = 0.0
//! trading_days = 252
//!
//! [optimizer]
//! sentiment_range = { start = -0.5, stop = 0.5, step = 0.1 }
//! volatility_range = { start = 20.0, stop = 80.0, step = 10.0 }
//! top_n = 10
//! stable_top_n = 10
//! stability_penalty = 0.5
//! parallel = true
//! max_cells = 100000
//! ```

use altalpha_core::engine::{ParamsError, SimulationParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::metrics::MetricsConfig;
use crate::stability::DEFAULT_STABILITY_PENALTY;
use crate::sweep::{GridError, ParamGrid, ParamRange};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("simulation: {0}")]
    Simulation(#[from] ParamsError),

    #[error("simulation.min_rows must be at least 1")]
    MinRows,

    #[error("metrics.trading_days must be positive")]
    TradingDays,

    #[error("metrics.risk_free_rate must be finite, got {0}")]
    RiskFreeRate(f64),

    #[error("optimizer.stability_penalty must be finite and non-negative, got {0}")]
    StabilityPenalty(f64),

    #[error("optimizer.volatility_range must lie within [0, 100], got {start}..={stop}")]
    VolatilityRange { start: f64, stop: f64 },

    #[error("optimizer.{name}: {source}")]
    Range {
        name: &'static str,
        #[source]
        source: GridError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    pub transaction_cost: f64,
    pub sentiment_threshold: f64,
    pub volatility_percentile: f64,
    /// Series shorter than this are treated as "no data".
    pub min_rows: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let params = SimulationParams::default();
        Self {
            initial_capital: params.initial_capital,
            transaction_cost: params.transaction_cost,
            sentiment_threshold: params.sentiment_threshold,
            volatility_percentile: params.volatility_percentile,
            min_rows: 1,
        }
    }
}

impl SimulationConfig {
    pub fn params(&self) -> SimulationParams {
        SimulationParams {
            initial_capital: self.initial_capital,
            transaction_cost: self.transaction_cost,
            sentiment_threshold: self.sentiment_threshold,
            volatility_percentile: self.volatility_percentile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    pub sentiment_range: ParamRange,
    pub volatility_range: ParamRange,
    pub top_n: usize,
    pub stable_top_n: usize,
    pub stability_penalty: f64,
    pub parallel: bool,
    pub max_cells: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            sentiment_range: ParamRange::new(-0.5, 0.5, 0.1),
            volatility_range: ParamRange::new(20.0, 80.0, 10.0),
            top_n: 10,
            stable_top_n: 10,
            stability_penalty: DEFAULT_STABILITY_PENALTY,
            parallel: true,
            max_cells: 100_000,
        }
    }
}

impl OptimizerConfig {
    pub fn grid(&self) -> Result<ParamGrid, ConfigError> {
        self.sentiment_range
            .validate()
            .map_err(|source| ConfigError::Range {
                name: "sentiment_range",
                source,
            })?;
        self.volatility_range
            .validate()
            .map_err(|source| ConfigError::Range {
                name: "volatility_range",
                source,
            })?;
        let ParamRange { start, stop, .. } = self.volatility_range;
        if start < 0.0 || stop > 100.0 {
            return Err(ConfigError::VolatilityRange { start, stop });
        }
        ParamGrid::from_ranges(&self.sentiment_range, &self.volatility_range, self.max_cells)
            .map_err(|source| ConfigError::Range {
                name: "max_cells",
                source,
            })
    }
}

/// Complete configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AltAlphaConfig {
    pub simulation: SimulationConfig,
    pub metrics: MetricsConfig,
    pub optimizer: OptimizerConfig,
}

impl AltAlphaConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.params().validate()?;
        if self.simulation.min_rows == 0 {
            return Err(ConfigError::MinRows);
        }
        if self.metrics.trading_days == 0 {
            return Err(ConfigError::TradingDays);
        }
        if !self.metrics.risk_free_rate.is_finite() {
            return Err(ConfigError::RiskFreeRate(self.metrics.risk_free_rate));
        }
        let penalty = self.optimizer.stability_penalty;
        if !penalty.is_finite() || penalty < 0.0 {
            return Err(ConfigError::StabilityPenalty(penalty));
        }
        self.optimizer.grid()?;
        Ok(())
    }
}
