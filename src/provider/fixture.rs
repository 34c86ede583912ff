//! In-memory provider
//!
//! Serves fixed series per ticker. Used by offline mode and tests; failures
//! and latency can be injected per instance.

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use std::collections::HashMap;
use std::time::Duration;

use super::{keep_latest, PricePoint, PriceProvider, ProviderError};

/// Provider backed by a fixed table of series
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    series: HashMap<String, Vec<PricePoint>>,
    failures: HashMap<String, String>,
    latency: Duration,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo data ending today
    pub fn sample() -> Self {
        Self::new()
            .with_closes("AAPL", &[150.0, 151.2, 149.8, 152.0, 153.5])
            .with_closes("GOOG", &[139.1, 140.6, 141.0, 138.7, 140.2])
            .with_closes("TSLA", &[242.8, 238.1, 245.6, 251.3, 248.9])
    }

    /// Serve `points` for `ticker`
    pub fn with_series(mut self, ticker: &str, points: Vec<PricePoint>) -> Self {
        self.series.insert(ticker.to_string(), points);
        self
    }

    /// Serve `closes` for `ticker` as consecutive days ending today
    pub fn with_closes(self, ticker: &str, closes: &[f64]) -> Self {
        let today = Utc::now().date_naive();
        let first = today
            .checked_sub_days(Days::new(closes.len().saturating_sub(1) as u64))
            .unwrap_or(NaiveDate::MIN);
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, close)| PricePoint {
                date: first + Days::new(i as u64),
                close: *close,
            })
            .collect();
        self.with_series(ticker, points)
    }

    /// Fail every request for `ticker` with `message`
    pub fn with_failure(mut self, ticker: &str, message: &str) -> Self {
        self.failures.insert(ticker.to_string(), message.to_string());
        self
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl PriceProvider for StaticProvider {
    fn id(&self) -> &'static str {
        "STATIC"
    }

    async fn daily_closes(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(message) = self.failures.get(ticker) {
            return Err(ProviderError::Upstream {
                provider: self.id(),
                message: message.clone(),
            });
        }

        let points = self.series.get(ticker).cloned().unwrap_or_default();
        Ok(keep_latest(points, lookback_days))
    }
}
