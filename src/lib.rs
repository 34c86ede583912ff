//! Tickerscope - instrumented stock dashboard
//!
//! This library provides the observability layer (span export, provider
//! latency histogram, pulled price gauge, Prometheus endpoint) and the small
//! dashboard pipeline it instruments.

pub mod config;
pub mod context;
pub mod dashboard;
pub mod fetch;
pub mod metrics;
pub mod provider;
pub mod trace;
pub mod util;

pub use config::Config;
pub use context::ObservabilityContext;
pub use dashboard::{Dashboard, PageView};
pub use fetch::{Fetched, PriceQuote, QuoteFetcher};

/// Version for display
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
