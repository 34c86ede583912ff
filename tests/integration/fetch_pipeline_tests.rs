//! Dashboard pipeline integration tests

use std::sync::Arc;
use std::time::Duration;

use tickerscope::config::{DashboardConfig, MetricsConfig};
use tickerscope::provider::StaticProvider;
use tickerscope::trace::{MemorySink, SpanExportLayer, SpanStatus};
use tickerscope::{Dashboard, Fetched, ObservabilityContext, PageView, QuoteFetcher};
use tracing_subscriber::prelude::*;

fn context() -> ObservabilityContext {
    let config = MetricsConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..Default::default()
    };
    ObservabilityContext::new(&config).unwrap()
}

fn dashboard(context: &ObservabilityContext, provider: StaticProvider) -> Dashboard {
    let fetcher = QuoteFetcher::new(Arc::new(provider), context.tracer(), context.latency());
    Dashboard::new(
        fetcher,
        context.price_gauge(),
        context.tracer(),
        &DashboardConfig::default(),
    )
}

/// AAPL with five closes shows the last one and a five point chart
#[tokio::test]
async fn test_known_ticker_page() {
    let context = context();
    let provider = StaticProvider::new().with_closes("AAPL", &[150.0, 151.2, 149.8, 152.0, 153.5]);
    let dashboard = dashboard(&context, provider);

    let page = dashboard.render_page("AAPL").await;

    assert_eq!(page.price_text(), Some("$153.50"));
    let chart = page.chart().expect("chart should be present");
    assert_eq!(chart.points.len(), 5);
    assert_eq!(chart.title, "AAPL - Last 5 Days");
    assert_eq!(
        chart.points.iter().map(|p| p.close).collect::<Vec<_>>(),
        vec![150.0, 151.2, 149.8, 152.0, 153.5]
    );
    assert_eq!(context.price_gauge().collect(), Some(153.5));

    let rendered = page.to_string();
    assert!(rendered.starts_with("Current Price of AAPL: $153.50\n"));
}

/// An unknown ticker degrades to an error message with no chart
#[tokio::test]
async fn test_unknown_ticker_page() {
    let context = context();
    let dashboard = dashboard(&context, StaticProvider::sample());

    let page = dashboard.render_page("ZZZINVALID").await;

    assert!(matches!(page, PageView::Unavailable { .. }));
    assert!(page.to_string().contains("Could not fetch stock price"));
    assert!(page.chart().is_none());
    assert_eq!(context.price_gauge().collect(), None);
    assert_eq!(context.latency().stats("ZZZINVALID").unwrap().count, 1);
}

/// Concurrent fetches keep one sample per call under the right label
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fetches_preserve_labels() {
    let context = context();
    let tickers: Vec<String> = (0..10).map(|i| format!("TK{}", i)).collect();

    let mut provider = StaticProvider::new().with_latency(Duration::from_millis(5));
    for (i, ticker) in tickers.iter().enumerate() {
        provider = provider.with_closes(ticker, &[i as f64 + 1.0]);
    }
    let fetcher = Arc::new(QuoteFetcher::new(
        Arc::new(provider),
        context.tracer(),
        context.latency(),
    ));

    let mut handles = Vec::new();
    for _ in 0..5 {
        for ticker in &tickers {
            let fetcher = fetcher.clone();
            let ticker = ticker.clone();
            handles.push(tokio::spawn(async move {
                let quote = fetcher.fetch(&ticker).await.found().unwrap();
                assert_eq!(quote.ticker, ticker);
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let latency = context.latency();
    assert_eq!(latency.total_samples(), 50);
    for ticker in &tickers {
        assert_eq!(latency.stats(ticker).unwrap().count, 5);
    }

    let exposition = context.registry().render();
    for ticker in &tickers {
        let line = format!("yahoo_api_response_time_ms_count{{ticker=\"{}\"}} 5", ticker);
        assert!(exposition.contains(&line), "missing {}", line);
    }
}

/// Page, fetch and chart spans nest and carry their status
#[tokio::test]
async fn test_page_spans_nest() {
    let sink = MemorySink::new();
    let _default = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(SpanExportLayer::new(sink.clone())),
    );

    let context = context();
    let provider = StaticProvider::sample().with_failure("TSLA", "HTTP 503");
    let dashboard = dashboard(&context, provider);

    dashboard.render_page("AAPL").await;
    dashboard.render_page("TSLA").await;

    let records = sink.records();
    let fetches: Vec<_> = records.iter().filter(|r| r.name == "fetch_stock_price").collect();
    assert_eq!(fetches.len(), 2);
    assert!(fetches
        .iter()
        .all(|r| r.path == vec!["stock_analysis_page", "fetch_stock_price"]));
    assert_eq!(fetches[0].status, SpanStatus::Ok);
    assert_eq!(fetches[1].status, SpanStatus::Error);

    let charts: Vec<_> = records.iter().filter(|r| r.name == "plot_stock_chart").collect();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].parent(), Some("stock_analysis_page"));

    let pages = records.iter().filter(|r| r.name == "stock_analysis_page").count();
    assert_eq!(pages, 2);
}

/// Provider failures count as absence and are still timed
#[tokio::test]
async fn test_provider_failure_is_absence() {
    let context = context();
    let provider = StaticProvider::new().with_failure("AAPL", "invalid crumb");
    let fetcher = QuoteFetcher::new(Arc::new(provider), context.tracer(), context.latency());

    let outcome = fetcher.fetch("AAPL").await;

    assert!(outcome.is_absent());
    assert!(matches!(outcome, Fetched::Failed(_)));
    assert_eq!(context.latency().stats("AAPL").unwrap().count, 1);
}
