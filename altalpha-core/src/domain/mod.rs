//! Domain types for AltAlpha

pub mod feature;
pub mod portfolio;
pub mod position;
pub mod signal;
pub mod step;
pub mod trade;

pub use feature::{FeatureRow, FeatureSeries, SeriesError};
pub use portfolio::PortfolioState;
pub use position::{OpenTrade, PositionState};
pub use signal::Signal;
pub use step::{CloseFill, OpenFill, SimulationStep, Transition};
pub use trade::Trade;
