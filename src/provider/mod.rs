//! Price data providers
//!
//! A provider returns the most recent daily closes for a ticker. Results are
//! ordered oldest first and may be empty when the provider knows nothing
//! about the ticker.

mod fixture;
mod yahoo;

pub use fixture::StaticProvider;
pub use yahoo::YahooProvider;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Errors raised by a provider call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The upstream service failed or rejected the request.
    #[error("{provider} request failed: {message}")]
    Upstream {
        provider: &'static str,
        message: String,
    },

    /// The call did not finish within the configured bound.
    #[error("request for {ticker} timed out after {after:?}")]
    Timeout { ticker: String, after: Duration },

    /// The upstream answered with data that cannot be used.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Source of daily closing prices
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short identifier used in logs
    fn id(&self) -> &'static str;

    /// Up to `lookback_days` most recent daily closes for `ticker`
    async fn daily_closes(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<Vec<PricePoint>, ProviderError>;
}

/// Keep only the newest `lookback_days` points of an ascending series
pub(crate) fn keep_latest(mut points: Vec<PricePoint>, lookback_days: u32) -> Vec<PricePoint> {
    let keep = lookback_days as usize;
    if points.len() > keep {
        points.drain(..points.len() - keep);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| PricePoint {
                date: start + chrono::Days::new(i as u64),
                close: *close,
            })
            .collect()
    }

    #[test]
    fn test_keep_latest_trims_oldest() {
        let kept = keep_latest(series(&[1.0, 2.0, 3.0, 4.0]), 2);
        assert_eq!(kept.iter().map(|p| p.close).collect::<Vec<_>>(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_keep_latest_short_series_untouched() {
        let kept = keep_latest(series(&[1.0, 2.0]), 5);
        assert_eq!(kept.len(), 2);
    }
}
