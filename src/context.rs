//! Observability context
//!
//! One explicitly constructed owner for the metrics registry, the latency
//! histogram, the price gauge, the tracer and the metrics exporter.
//!
//! Lifecycle: [`ObservabilityContext::new`] builds everything without side
//! effects, [`ObservabilityContext::init_once`] starts the exporter (any
//! number of calls, one listener) and [`ObservabilityContext::shutdown`]
//! stops it.

use std::sync::Arc;
use tracing::info;

use crate::config::MetricsConfig;
use crate::metrics::{
    ExporterError, ExporterStatus, GaugePublisher, LatencyHistogram, MetricsError,
    MetricsExporter, MetricsRegistry, PRICE_GAUGE_METRIC,
};
use crate::trace::Tracer;

/// Owns every observability handle used by the dashboard
pub struct ObservabilityContext {
    config: MetricsConfig,
    registry: Arc<MetricsRegistry>,
    latency: Arc<LatencyHistogram>,
    price_gauge: Arc<GaugePublisher>,
    tracer: Tracer,
    exporter: MetricsExporter,
}

impl ObservabilityContext {
    pub fn new(config: &MetricsConfig) -> Result<Self, MetricsError> {
        let registry = Arc::new(MetricsRegistry::new(config)?);
        let latency = Arc::new(LatencyHistogram::new(registry.clone()));
        let price_gauge = registry.gauge_publisher(PRICE_GAUGE_METRIC);
        let exporter = MetricsExporter::new(registry.clone(), config.path.clone());

        Ok(Self {
            config: config.clone(),
            registry,
            latency,
            price_gauge,
            tracer: Tracer::new(),
            exporter,
        })
    }

    /// Start the metrics endpoint if enabled. Returns `None` when disabled.
    pub fn init_once(&self) -> Result<Option<ExporterStatus>, ExporterError> {
        if !self.config.enabled {
            info!("Metrics endpoint disabled");
            return Ok(None);
        }
        self.exporter.start_once(self.config.bind_addr).map(Some)
    }

    /// Stop the metrics endpoint
    pub fn shutdown(&self) {
        self.exporter.shutdown();
    }

    pub fn tracer(&self) -> Tracer {
        self.tracer
    }

    pub fn latency(&self) -> Arc<LatencyHistogram> {
        self.latency.clone()
    }

    pub fn price_gauge(&self) -> Arc<GaugePublisher> {
        self.price_gauge.clone()
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    pub fn exporter(&self) -> &MetricsExporter {
        &self.exporter
    }
}
