//! Stock dashboard presenter
//!
//! One page load per ticker: fetch the price, publish it to the gauge and
//! fetch the chart history. Any missing data degrades the page instead of
//! failing it.

mod view;

pub use view::{Chart, PageView, PriceMetric};

use std::sync::Arc;
use tracing::info;

use crate::config::DashboardConfig;
use crate::fetch::{Fetched, QuoteFetcher};
use crate::metrics::GaugePublisher;
use crate::trace::Tracer;

/// Drives the instrumented fetches for a page and builds its view
pub struct Dashboard {
    fetcher: QuoteFetcher,
    price_gauge: Arc<GaugePublisher>,
    tracer: Tracer,
    chart_days: u32,
}

impl Dashboard {
    pub fn new(
        fetcher: QuoteFetcher,
        price_gauge: Arc<GaugePublisher>,
        tracer: Tracer,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            fetcher,
            price_gauge,
            tracer,
            chart_days: config.chart_days,
        }
    }

    /// Build the page for `ticker`
    pub async fn render_page(&self, ticker: &str) -> PageView {
        if ticker.trim().is_empty() {
            return PageView::Idle;
        }

        let span = self.tracer.start_span("stock_analysis_page").with_ticker(ticker);
        span.wrap(self.analyze(ticker)).await
    }

    async fn analyze(&self, ticker: &str) -> PageView {
        let quote = match self.fetcher.fetch(ticker).await {
            Fetched::Found(quote) => quote,
            Fetched::NoData | Fetched::Failed(_) => return PageView::unavailable(),
        };

        self.price_gauge.publish(quote.price);
        info!(ticker, price = quote.price, "Price gauge updated");

        let metric = PriceMetric::new(ticker, quote.price);
        match self.fetcher.history(ticker, self.chart_days).await {
            Fetched::Found(series) => PageView::Quote {
                metric,
                chart: Some(Chart::new(ticker, self.chart_days, series.points)),
                warning: None,
            },
            Fetched::NoData | Fetched::Failed(_) => PageView::Quote {
                metric,
                chart: None,
                warning: Some(format!("No chart data found for {}", ticker)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;
    use crate::metrics::{LatencyHistogram, MetricsRegistry, PRICE_GAUGE_METRIC};
    use crate::provider::{PricePoint, PriceProvider, ProviderError, StaticProvider};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn dashboard(provider: Arc<dyn PriceProvider>) -> (Dashboard, Arc<GaugePublisher>) {
        let registry = Arc::new(MetricsRegistry::new(&MetricsConfig::default()).unwrap());
        let latency = Arc::new(LatencyHistogram::new(registry.clone()));
        let gauge = registry.gauge_publisher(PRICE_GAUGE_METRIC);
        let fetcher = QuoteFetcher::new(provider, Tracer::new(), latency);
        let dashboard = Dashboard::new(fetcher, gauge.clone(), Tracer::new(), &DashboardConfig::default());
        (dashboard, gauge)
    }

    /// Answers the one-day lookup but fails any longer history request
    struct PriceOnlyProvider;

    #[async_trait]
    impl PriceProvider for PriceOnlyProvider {
        fn id(&self) -> &'static str {
            "PRICE_ONLY"
        }

        async fn daily_closes(
            &self,
            _ticker: &str,
            lookback_days: u32,
        ) -> Result<Vec<PricePoint>, ProviderError> {
            if lookback_days > 1 {
                return Err(ProviderError::InvalidData("history unavailable".to_string()));
            }
            Ok(vec![PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
                close: 87.126,
            }])
        }
    }

    #[test]
    fn test_blank_ticker_is_idle() {
        let (dashboard, gauge) = dashboard(Arc::new(StaticProvider::sample()));
        let page = tokio_test::block_on(dashboard.render_page("   "));
        assert_eq!(page, PageView::Idle);
        assert_eq!(gauge.collect(), None);
    }

    #[test]
    fn test_missing_history_keeps_price() {
        let (dashboard, gauge) = dashboard(Arc::new(PriceOnlyProvider));
        let page = tokio_test::block_on(dashboard.render_page("MSFT"));

        assert_eq!(page.price_text(), Some("$87.13"));
        assert!(page.chart().is_none());
        match page {
            PageView::Quote { warning, .. } => {
                assert_eq!(warning.as_deref(), Some("No chart data found for MSFT"));
            }
            other => panic!("expected quote page, got {:?}", other),
        }
        assert_eq!(gauge.collect(), Some(87.126));
    }

    #[test]
    fn test_failed_price_leaves_gauge_untouched() {
        let provider = StaticProvider::sample().with_failure("TSLA", "connection refused");
        let (dashboard, gauge) = dashboard(Arc::new(provider));

        tokio_test::block_on(dashboard.render_page("AAPL"));
        let page = tokio_test::block_on(dashboard.render_page("TSLA"));

        assert_eq!(page, PageView::unavailable());
        assert_eq!(gauge.collect(), Some(153.5));
    }
}
