//! Provider latency histogram
//!
//! Records every provider call into the Prometheus histogram and keeps a
//! per-ticker tally alongside it for quick inspection.

use dashmap::DashMap;
use metrics::Label;
use std::sync::Arc;
use std::time::Duration;

use super::registry::{MetricsRegistry, API_LATENCY_METRIC};

/// Accumulated samples for one ticker
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleStats {
    pub count: u64,
    pub sum_ms: f64,
}

impl SampleStats {
    /// Mean latency in milliseconds
    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_ms / self.count as f64
        }
    }
}

/// Append-only latency histogram labelled by ticker
pub struct LatencyHistogram {
    registry: Arc<MetricsRegistry>,
    samples: DashMap<String, SampleStats>,
}

impl LatencyHistogram {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self {
            registry,
            samples: DashMap::new(),
        }
    }

    /// Record one provider call for `ticker`
    pub fn record(&self, ticker: &str, elapsed: Duration) {
        let millis = elapsed.as_secs_f64() * 1000.0;

        self.registry
            .histogram(API_LATENCY_METRIC, vec![Label::new("ticker", ticker.to_string())])
            .record(millis);

        let mut stats = self.samples.entry(ticker.to_string()).or_default();
        stats.count += 1;
        stats.sum_ms += millis;
    }

    /// Samples recorded so far for `ticker`
    pub fn stats(&self, ticker: &str) -> Option<SampleStats> {
        self.samples.get(ticker).map(|entry| *entry.value())
    }

    /// Samples recorded so far across all tickers
    pub fn total_samples(&self) -> u64 {
        self.samples.iter().map(|entry| entry.value().count).sum()
    }
}
