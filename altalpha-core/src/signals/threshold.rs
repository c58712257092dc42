//! Volatility percentile threshold.
//!
//! The threshold is computed once per run over every non-missing volatility
//! value in the series, including future rows. This is a known look-ahead in
//! the strategy definition and is kept on purpose so results stay comparable.

/// Sorted volatility values, built once and queried per percentile.
///
/// Grid search evaluates many percentiles against the same series; sorting
/// once keeps each lookup O(1).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolatilityDistribution {
    sorted: Vec<f64>,
}

impl VolatilityDistribution {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        Self { sorted }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Value at `percentile` (0–100) with linear interpolation between the
    /// two closest ranks. `None` when there are no values.
    pub fn threshold(&self, percentile: f64) -> Option<f64> {
        interpolate(&self.sorted, percentile)
    }
}

/// One-shot percentile over an unsorted slice.
pub fn percentile(values: &[f64], percentile: f64) -> Option<f64> {
    VolatilityDistribution::new(values.iter().copied()).threshold(percentile)
}

fn interpolate(sorted: &[f64], percentile: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let rank = percentile.clamp(0.0, 100.0) / 100.0 * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
