//! AltAlpha Core: feature series, sentiment signal rule and the two simulation engines.
//!
//! This crate contains the deterministic heart of the lab:
//! - Domain types (feature rows, signals, positions, trades, portfolio snapshots)
//! - Feature derivation from closes and daily sentiment
//! - Signal rule with a full-series volatility percentile filter
//! - Vectorized backtest with a one-day position lag
//! - Stateful day-by-day live simulation with a trade ledger
//!
//! Nothing here touches the filesystem or the network.

pub mod domain;
pub mod engine;
pub mod features;
pub mod signals;
pub mod synthetic;
