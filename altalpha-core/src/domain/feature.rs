//! FeatureRow and FeatureSeries: the per-day input consumed by every engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One trading day of price, return, sentiment and derived rolling features.
///
/// Optional fields are `None` when the upstream window was too short to
/// produce a value (first-day return, single-observation volatility).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(rename = "return")]
    pub daily_return: Option<f64>,
    pub sentiment: Option<f64>,
    pub sentiment_avg_5d: Option<f64>,
    pub volatility_5d: Option<f64>,
}

impl FeatureRow {
    /// Daily return with a missing value treated as no move.
    pub fn return_or_zero(&self) -> f64 {
        self.daily_return.unwrap_or(0.0)
    }
}

/// Malformed input rows. These are faults, not "no data".
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("row {index} ({date}): close must be finite and positive, got {close}")]
    InvalidClose {
        index: usize,
        date: NaiveDate,
        close: f64,
    },

    #[error("row {index}: date {date} does not follow {previous} (rows must be strictly increasing)")]
    NonIncreasingDate {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("row {index} ({date}): {field} is not finite")]
    NonFiniteFeature {
        index: usize,
        date: NaiveDate,
        field: &'static str,
    },
}

/// An ordered, validated sequence of feature rows for one ticker.
///
/// Read-only once constructed. An empty series is valid and means "no data".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSeries {
    ticker: String,
    rows: Vec<FeatureRow>,
}

impl FeatureSeries {
    /// Validate and wrap a row sequence.
    ///
    /// Dates must be strictly increasing (no duplicates), closes finite and
    /// positive, and any present feature value finite.
    pub fn new(ticker: impl Into<String>, rows: Vec<FeatureRow>) -> Result<Self, SeriesError> {
        let mut previous: Option<NaiveDate> = None;

        for (index, row) in rows.iter().enumerate() {
            if !row.close.is_finite() || row.close <= 0.0 {
                return Err(SeriesError::InvalidClose {
                    index,
                    date: row.date,
                    close: row.close,
                });
            }

            if let Some(prev) = previous {
                if row.date <= prev {
                    return Err(SeriesError::NonIncreasingDate {
                        index,
                        date: row.date,
                        previous: prev,
                    });
                }
            }
            previous = Some(row.date);

            let optional_fields = [
                ("return", row.daily_return),
                ("sentiment", row.sentiment),
                ("sentiment_avg_5d", row.sentiment_avg_5d),
                ("volatility_5d", row.volatility_5d),
            ];
            for (field, value) in optional_fields {
                if value.is_some_and(|v| !v.is_finite()) {
                    return Err(SeriesError::NonFiniteFeature {
                        index,
                        date: row.date,
                        field,
                    });
                }
            }
        }

        Ok(Self {
            ticker: ticker.into().to_uppercase(),
            rows,
        })
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            rows: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All non-missing values of the volatility column, in row order.
    pub fn volatility_values(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.volatility_5d).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// BLAKE3 fingerprint over ticker and row contents.
    ///
    /// Two series with identical rows hash identically, so reports produced
    /// from them can be compared directly.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.ticker.as_bytes());
        for row in &self.rows {
            hasher.update(row.date.to_string().as_bytes());
            hasher.update(&row.close.to_le_bytes());
            for value in [
                row.daily_return,
                row.sentiment,
                row.sentiment_avg_5d,
                row.volatility_5d,
            ] {
                match value {
                    Some(v) => {
                        hasher.update(&[1]);
                        hasher.update(&v.to_le_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}
