//! Instrumented provider calls
//!
//! Every call runs inside its own span. Price lookups are timed and recorded
//! into the latency histogram whether or not data came back, and provider
//! failures are turned into values instead of propagating.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::metrics::LatencyHistogram;
use crate::provider::{PricePoint, PriceProvider, ProviderError};
use crate::trace::Tracer;

/// Latest price of a ticker
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub ticker: String,
    pub price: f64,
    pub as_of: NaiveDate,
}

/// Recent daily closes of a ticker, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub points: Vec<PricePoint>,
}

/// Result of an instrumented lookup
#[derive(Debug, Clone)]
pub enum Fetched<T> {
    /// The provider returned data
    Found(T),
    /// The provider answered with nothing for this ticker
    NoData,
    /// The provider call failed or timed out
    Failed(ProviderError),
}

impl<T> Fetched<T> {
    /// True when there is nothing to show, whatever the reason
    pub fn is_absent(&self) -> bool {
        !matches!(self, Fetched::Found(_))
    }

    /// The fetched value, if any
    pub fn found(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// Wraps a [`PriceProvider`] with spans, latency recording and a timeout
pub struct QuoteFetcher {
    provider: Arc<dyn PriceProvider>,
    tracer: Tracer,
    latency: Arc<LatencyHistogram>,
    timeout: Option<Duration>,
}

impl QuoteFetcher {
    pub fn new(provider: Arc<dyn PriceProvider>, tracer: Tracer, latency: Arc<LatencyHistogram>) -> Self {
        Self {
            provider,
            tracer,
            latency,
            timeout: None,
        }
    }

    /// Bound every provider call by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Latest close for `ticker`
    pub async fn fetch(&self, ticker: &str) -> Fetched<PriceQuote> {
        let span = self.tracer.start_span("fetch_stock_price").with_ticker(ticker);

        let outcome = span
            .wrap(async {
                info!(ticker, provider = self.provider.id(), "Fetching stock price");

                let start = Instant::now();
                let result = self.call_provider(ticker, 1).await;
                let elapsed = start.elapsed();
                self.latency.record(ticker, elapsed);

                info!(
                    ticker,
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    "Provider call completed"
                );

                match result {
                    Ok(points) => match points.last() {
                        Some(latest) => {
                            info!(ticker, price = latest.close, "Latest price fetched");
                            Fetched::Found(PriceQuote {
                                ticker: ticker.to_string(),
                                price: latest.close,
                                as_of: latest.date,
                            })
                        }
                        None => {
                            warn!(ticker, "No data returned");
                            Fetched::NoData
                        }
                    },
                    Err(e) => {
                        warn!(ticker, error = %e, "Price lookup failed");
                        Fetched::Failed(e)
                    }
                }
            })
            .await;

        if let Fetched::Failed(e) = &outcome {
            span.fail(e);
        }
        outcome
    }

    /// Last `days` daily closes for `ticker`
    pub async fn history(&self, ticker: &str, days: u32) -> Fetched<PriceSeries> {
        let span = self.tracer.start_span("plot_stock_chart").with_ticker(ticker);

        let outcome = span
            .wrap(async {
                info!(ticker, days, "Fetching price history");

                match self.call_provider(ticker, days).await {
                    Ok(points) if points.is_empty() => {
                        warn!(ticker, "No chart data returned");
                        Fetched::NoData
                    }
                    Ok(points) => Fetched::Found(PriceSeries {
                        ticker: ticker.to_string(),
                        points,
                    }),
                    Err(e) => {
                        warn!(ticker, error = %e, "History lookup failed");
                        Fetched::Failed(e)
                    }
                }
            })
            .await;

        if let Fetched::Failed(e) = &outcome {
            span.fail(e);
        }
        outcome
    }

    async fn call_provider(&self, ticker: &str, days: u32) -> Result<Vec<PricePoint>, ProviderError> {
        let call = self.provider.daily_closes(ticker, days);
        match self.timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .map_err(|_| ProviderError::Timeout {
                    ticker: ticker.to_string(),
                    after,
                })?,
            None => call.await,
        }
    }
}
