//! Feature construction: join closes with daily sentiment and derive the
//! rolling columns the signal rule reads.
//!
//! - `return`: close-to-close percent change, rounded to 6 dp (`None` on day 0)
//! - `sentiment_avg_5d`: mean of up to the last 5 sentiment values, rounded to 4 dp
//! - `volatility_5d`: sample std of the valid returns among the last 5 rows,
//!   rounded to 6 dp (`None` with fewer than 2 valid returns)

use crate::domain::{FeatureRow, FeatureSeries, SeriesError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Rolling window length for both derived features.
pub const ROLLING_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub date: NaiveDate,
    pub sentiment: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("duplicate sentiment observation for {date}")]
    DuplicateSentiment { date: NaiveDate },

    #[error("sentiment for {date} is not finite")]
    NonFiniteSentiment { date: NaiveDate },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Percent change between consecutive closes. The first entry is `None`.
pub fn daily_returns(prices: &[PriceBar]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(prices.len());
    let mut previous: Option<f64> = None;
    for bar in prices {
        out.push(previous.map(|prev| round_to(bar.close / prev - 1.0, 6)));
        previous = Some(bar.close);
    }
    out
}

/// Mean over up to the last `window` values ending at each index.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Sample standard deviation over the present values among the last
/// `window` entries. `None` when fewer than two values are present.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let present: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
            sample_std(&present)
        })
        .collect()
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Inner-join prices with sentiment on date and derive the feature columns.
///
/// Returns are computed on the full price history before the join, so a
/// day missing sentiment still anchors the next day's return. Rolling
/// windows run over the joined rows.
pub fn merge_price_and_sentiment(
    ticker: &str,
    prices: &[PriceBar],
    sentiment: &[SentimentPoint],
) -> Result<FeatureSeries, FeatureError> {
    let mut by_date: HashMap<NaiveDate, f64> = HashMap::with_capacity(sentiment.len());
    for point in sentiment {
        if !point.sentiment.is_finite() {
            return Err(FeatureError::NonFiniteSentiment { date: point.date });
        }
        if by_date.insert(point.date, point.sentiment).is_some() {
            return Err(FeatureError::DuplicateSentiment { date: point.date });
        }
    }

    let mut prices = prices.to_vec();
    prices.sort_by_key(|bar| bar.date);
    let returns = daily_returns(&prices);

    let joined: Vec<(PriceBar, Option<f64>, f64)> = prices
        .iter()
        .zip(returns)
        .filter_map(|(bar, ret)| by_date.get(&bar.date).map(|&s| (*bar, ret, s)))
        .collect();

    let sentiments: Vec<f64> = joined.iter().map(|(_, _, s)| *s).collect();
    let joined_returns: Vec<Option<f64>> = joined.iter().map(|(_, r, _)| *r).collect();
    let sentiment_avg = rolling_mean(&sentiments, ROLLING_WINDOW);
    let volatility = rolling_std(&joined_returns, ROLLING_WINDOW);

    let rows = joined
        .iter()
        .enumerate()
        .map(|(i, (bar, ret, sent))| FeatureRow {
            date: bar.date,
            close: round_to(bar.close, 2),
            daily_return: *ret,
            sentiment: Some(*sent),
            sentiment_avg_5d: Some(round_to(sentiment_avg[i], 4)),
            volatility_5d: volatility[i].map(|v| round_to(v, 6)),
        })
        .collect();

    tracing::debug!(
        ticker,
        prices = prices.len(),
        sentiment = sentiment.len(),
        joined = joined.len(),
        "merged price and sentiment"
    );

    Ok(FeatureSeries::new(ticker, rows)?)
}
