//! Feature series loading from CSV or the synthetic generator.
//!
//! Two CSV layouts are accepted, detected from the header row:
//! - raw: `date,close,sentiment` (features are derived on load)
//! - features: `date,close,return,sentiment,sentiment_avg_5d,volatility_5d`
//!
//! Empty cells read as missing values.

use altalpha_core::domain::{FeatureRow, FeatureSeries, SeriesError};
use altalpha_core::features::{merge_price_and_sentiment, FeatureError, PriceBar, SentimentPoint};
use altalpha_core::synthetic::{synthetic_prices, synthetic_sentiment};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from data loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unrecognized CSV header [{0}]; expected date,close,sentiment or the full feature layout")]
    UnknownLayout(String),

    #[error("synthetic range is empty: {start} > {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("feature error: {0}")]
    Features(#[from] FeatureError),

    #[error("malformed series: {0}")]
    Series(#[from] SeriesError),
}

/// Where a series comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic { start: NaiveDate, end: NaiveDate },
}

/// A loaded series plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSeries {
    pub series: FeatureSeries,
    pub synthetic: bool,
    pub dataset_hash: String,
}

impl LoadedSeries {
    pub fn new(series: FeatureSeries, synthetic: bool) -> Self {
        let dataset_hash = series.fingerprint();
        Self {
            series,
            synthetic,
            dataset_hash,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    Raw,
    Features,
}

impl CsvLayout {
    /// Detect the layout from a header row. Column order does not matter.
    pub fn detect(headers: &csv::StringRecord) -> Option<Self> {
        let has = |name: &str| headers.iter().any(|h| h.trim() == name);
        if !(has("date") && has("close") && has("sentiment")) {
            return None;
        }
        if has("return") && has("sentiment_avg_5d") && has("volatility_5d") {
            Some(Self::Features)
        } else {
            Some(Self::Raw)
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    date: NaiveDate,
    close: f64,
    sentiment: Option<f64>,
}

/// Load a series for `ticker` from `source`.
pub fn load_series(source: &DataSource, ticker: &str) -> Result<LoadedSeries, LoadError> {
    match source {
        DataSource::Csv(path) => {
            let series = load_csv(path, ticker)?;
            Ok(LoadedSeries::new(series, false))
        }
        DataSource::Synthetic { start, end } => {
            tracing::warn!(ticker, %start, %end, "using synthetic data");
            let series = synthetic_series(ticker, *start, *end)?;
            Ok(LoadedSeries::new(series, true))
        }
    }
}

/// Read a CSV file in either layout.
pub fn load_csv(path: &Path, ticker: &str) -> Result<FeatureSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = read_csv(file, ticker)?;
    tracing::info!(
        ticker = series.ticker(),
        rows = series.len(),
        path = %path.display(),
        "loaded feature series"
    );
    Ok(series)
}

/// Parse CSV content from any reader.
pub fn read_csv<R: std::io::Read>(reader: R, ticker: &str) -> Result<FeatureSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let layout = CsvLayout::detect(&headers)
        .ok_or_else(|| LoadError::UnknownLayout(headers.iter().collect::<Vec<_>>().join(",")))?;

    match layout {
        CsvLayout::Features => {
            let rows = rdr
                .deserialize::<FeatureRow>()
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FeatureSeries::new(ticker, rows)?)
        }
        CsvLayout::Raw => {
            let records = rdr
                .deserialize::<RawRecord>()
                .collect::<Result<Vec<_>, _>>()?;
            let prices: Vec<PriceBar> = records
                .iter()
                .map(|r| PriceBar {
                    date: r.date,
                    close: r.close,
                })
                .collect();
            let sentiment: Vec<SentimentPoint> = records
                .iter()
                .filter_map(|r| {
                    r.sentiment.map(|s| SentimentPoint {
                        date: r.date,
                        sentiment: s,
                    })
                })
                .collect();
            Ok(merge_price_and_sentiment(ticker, &prices, &sentiment)?)
        }
    }
}

/// Deterministic synthetic series for `ticker` over `[start, end]`.
pub fn synthetic_series(
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<FeatureSeries, LoadError> {
    if start > end {
        return Err(LoadError::EmptyRange { start, end });
    }
    let prices = synthetic_prices(ticker, start, end);
    let dates: Vec<NaiveDate> = prices.iter().map(|b| b.date).collect();
    let sentiment = synthetic_sentiment(ticker, &dates);
    Ok(merge_price_and_sentiment(ticker, &prices, &sentiment)?)
}

/// Write a series in the features layout.
pub fn write_features_csv(path: &Path, series: &FeatureSeries) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in series.rows() {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_layouts() {
        let raw = csv::StringRecord::from(vec!["date", "close", "sentiment"]);
        let full = csv::StringRecord::from(vec![
            "date",
            "close",
            "return",
            "sentiment",
            "sentiment_avg_5d",
            "volatility_5d",
        ]);
        let bad = csv::StringRecord::from(vec!["date", "price"]);
        assert_eq!(CsvLayout::detect(&raw), Some(CsvLayout::Raw));
        assert_eq!(CsvLayout::detect(&full), Some(CsvLayout::Features));
        assert_eq!(CsvLayout::detect(&bad), None);
    }

    #[test]
    fn raw_layout_derives_features() {
        let csv = "date,close,sentiment\n\
                   2024-01-02,100.0,0.1\n\
                   2024-01-03,101.0,0.3\n\
                   2024-01-04,99.0,\n\
                   2024-01-05,100.0,-0.2\n";
        let series = read_csv(csv.as_bytes(), "abc").unwrap();
        assert_eq!(series.ticker(), "ABC");
        // Row without sentiment drops out of the join
        assert_eq!(series.len(), 3);
        assert_eq!(series.rows()[1].sentiment_avg_5d, Some(0.2));
        assert_eq!(series.rows()[0].daily_return, None);
    }

    #[test]
    fn features_layout_reads_missing_cells() {
        let csv = "date,close,return,sentiment,sentiment_avg_5d,volatility_5d\n\
                   2024-01-02,100.0,,0.1,0.1,\n\
                   2024-01-03,101.0,0.01,0.3,0.2,\n\
                   2024-01-04,99.0,-0.0198,0.1,0.1667,0.020936\n";
        let series = read_csv(csv.as_bytes(), "XYZ").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.rows()[0].daily_return, None);
        assert_eq!(series.rows()[0].volatility_5d, None);
        assert_eq!(series.rows()[2].volatility_5d, Some(0.020936));
    }

    #[test]
    fn unknown_header_is_an_error() {
        let err = read_csv("when,price\n2024-01-02,1\n".as_bytes(), "X").unwrap_err();
        assert!(matches!(err, LoadError::UnknownLayout(_)));
    }

    #[test]
    fn bad_date_is_an_error() {
        let err = read_csv("date,close,sentiment\nnot-a-date,1.0,0.1\n".as_bytes(), "X").unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn synthetic_series_is_tagged_and_stable() {
        let source = DataSource::Synthetic {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        };
        let a = load_series(&source, "SPY").unwrap();
        let b = load_series(&source, "SPY").unwrap();
        assert!(a.synthetic);
        assert_eq!(a.dataset_hash, b.dataset_hash);
        assert!(!a.series.is_empty());
    }

    #[test]
    fn inverted_synthetic_range_is_rejected() {
        let err = synthetic_series(
            "SPY",
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::EmptyRange { .. }));
    }
}
