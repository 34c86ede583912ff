//! Prometheus recorder ownership
//!
//! The recorder is built but never installed globally; every metric handle
//! is obtained through a `MetricsRegistry` so tests and embedders can run
//! several independent registries in one process.

use std::sync::Arc;

use metrics::{Gauge, Histogram, Key, KeyName, Label, Level, Metadata, Recorder, SharedString, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use parking_lot::RwLock;

use super::gauge::GaugePublisher;
use crate::config::MetricsConfig;

/// Provider call latency histogram, labelled by ticker
pub const API_LATENCY_METRIC: &str = "yahoo_api_response_time_ms";

/// Latest observed stock price, unlabelled
pub const PRICE_GAUGE_METRIC: &str = "stock_price_usd";

static METADATA: Metadata<'static> = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Anything that can produce a text exposition on demand
pub trait MetricsSource: Send + Sync + 'static {
    /// Render the current snapshot of all metrics
    fn render(&self) -> String;
}

/// Error type for metrics setup.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Invalid histogram buckets or exporter settings.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
}

/// Owns the Prometheus recorder and the gauge publishers it pulls from
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    publishers: RwLock<Vec<Arc<GaugePublisher>>>,
}

impl MetricsRegistry {
    /// Build a registry with the dashboard's metric descriptions
    pub fn new(config: &MetricsConfig) -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(API_LATENCY_METRIC.to_string()),
                &config.latency_buckets_ms,
            )
            .map_err(|e| MetricsError::Configuration(e.to_string()))?
            .build_recorder();
        let handle = recorder.handle();

        recorder.describe_histogram(
            KeyName::from_const_str(API_LATENCY_METRIC),
            Some(Unit::Milliseconds),
            SharedString::from("Time taken to fetch Yahoo Finance data"),
        );
        recorder.describe_gauge(
            KeyName::from_const_str(PRICE_GAUGE_METRIC),
            None,
            SharedString::from("Latest stock price (USD)"),
        );

        Ok(Self {
            recorder,
            handle,
            publishers: RwLock::new(Vec::new()),
        })
    }

    /// Get a histogram handle for `name` with the given labels
    pub fn histogram(&self, name: &'static str, labels: Vec<Label>) -> Histogram {
        self.recorder
            .register_histogram(&Key::from_parts(name, labels), &METADATA)
    }

    /// Get an unlabelled gauge handle for `name`
    pub fn gauge(&self, name: &'static str) -> Gauge {
        self.recorder
            .register_gauge(&Key::from_name(name), &METADATA)
    }

    /// Create a gauge publisher whose value is pulled on every render
    pub fn gauge_publisher(&self, name: &'static str) -> Arc<GaugePublisher> {
        let publisher = Arc::new(GaugePublisher::new(name));
        self.publishers.write().push(publisher.clone());
        publisher
    }

    /// Render the Prometheus text exposition
    pub fn render(&self) -> String {
        for publisher in self.publishers.read().iter() {
            // Unobserved gauges stay unregistered so they never render as 0
            if let Some(value) = publisher.collect() {
                self.gauge(publisher.name()).set(value);
            }
        }
        self.handle.render()
    }
}

impl MetricsSource for MetricsRegistry {
    fn render(&self) -> String {
        MetricsRegistry::render(self)
    }
}
