//! Metrics and observability
//!
//! Prometheus-compatible metrics: a provider latency histogram, a pulled
//! price gauge and the HTTP endpoint that exposes both.

mod exporter;
mod gauge;
mod histogram;
mod registry;

pub use exporter::{ExporterError, ExporterStatus, MetricsExporter};
pub use gauge::GaugePublisher;
pub use histogram::{LatencyHistogram, SampleStats};
pub use registry::{
    MetricsError, MetricsRegistry, MetricsSource, API_LATENCY_METRIC, PRICE_GAUGE_METRIC,
};
