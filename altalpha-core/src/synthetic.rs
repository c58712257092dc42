//! Deterministic synthetic prices and sentiment.
//!
//! Both generators seed from BLAKE3 of the ticker, so the same ticker always
//! produces the same series. Used for demos, tests and benchmarks when no
//! data file is supplied.

use crate::features::{round_to, rolling_mean, PriceBar, SentimentPoint};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn seeded_rng(ticker: &str, stream: &str) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ticker.to_uppercase().as_bytes());
    hasher.update(stream.as_bytes());
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

/// Weekday random walk starting at 100.0 with daily moves in ±3%.
pub fn synthetic_prices(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    let mut rng = seeded_rng(ticker, "prices");
    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        price *= 1.0 + daily_return;
        bars.push(PriceBar {
            date: current,
            close: round_to(price, 2),
        });
        current += chrono::Duration::days(1);
    }

    bars
}

/// Smoothed Gaussian sentiment aligned with `dates`, clipped to [-1, 1].
///
/// Raw scores are N(0, 0.3²), then averaged over up to 5 days.
pub fn synthetic_sentiment(ticker: &str, dates: &[NaiveDate]) -> Vec<SentimentPoint> {
    let mut rng = seeded_rng(ticker, "sentiment");
    let raw: Vec<f64> = dates.iter().map(|_| standard_normal(&mut rng) * 0.3).collect();
    let smoothed = rolling_mean(&raw, 5);

    dates
        .iter()
        .zip(smoothed)
        .map(|(&date, value)| SentimentPoint {
            date,
            sentiment: round_to(value.clamp(-1.0, 1.0), 4),
        })
        .collect()
}

// Box-Muller
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    #[test]
    fn prices_are_deterministic_per_ticker() {
        let (start, end) = range();
        assert_eq!(
            synthetic_prices("spy", start, end),
            synthetic_prices("SPY", start, end)
        );
        assert_ne!(
            synthetic_prices("SPY", start, end),
            synthetic_prices("QQQ", start, end)
        );
    }

    #[test]
    fn prices_skip_weekends() {
        let (start, end) = range();
        let bars = synthetic_prices("SPY", start, end);
        assert!(!bars.is_empty());
        assert!(bars
            .iter()
            .all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(bars.iter().all(|b| b.close > 0.0));
    }

    #[test]
    fn sentiment_is_bounded_and_aligned() {
        let (start, end) = range();
        let dates: Vec<_> = synthetic_prices("AAPL", start, end)
            .iter()
            .map(|b| b.date)
            .collect();
        let sentiment = synthetic_sentiment("AAPL", &dates);
        assert_eq!(sentiment.len(), dates.len());
        assert!(sentiment.iter().all(|p| (-1.0..=1.0).contains(&p.sentiment)));
        assert_eq!(sentiment, synthetic_sentiment("AAPL", &dates));
    }
}
