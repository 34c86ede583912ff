//! Metrics endpoint integration tests

use std::net::SocketAddr;
use std::sync::Arc;

use tickerscope::config::{DashboardConfig, MetricsConfig};
use tickerscope::metrics::ExporterStatus;
use tickerscope::provider::StaticProvider;
use tickerscope::{Dashboard, ObservabilityContext, QuoteFetcher};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn local_config() -> MetricsConfig {
    MetricsConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..Default::default()
    }
}

async fn scrape(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path);
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

fn started_addr(status: Option<ExporterStatus>) -> SocketAddr {
    match status {
        Some(ExporterStatus::Started(addr)) => addr,
        other => panic!("expected exporter to start, got {:?}", other),
    }
}

/// Scrape reflects fetch latency and the last published price
#[tokio::test]
async fn test_scrape_after_page_load() {
    let context = ObservabilityContext::new(&local_config()).unwrap();
    let addr = started_addr(context.init_once().unwrap());

    // Before any page load the gauge has no observation
    let before = scrape(addr, "/metrics").await;
    assert!(before.starts_with("HTTP/1.1 200 OK"));
    assert!(!before.lines().any(|line| line.starts_with("stock_price_usd")));

    let fetcher = QuoteFetcher::new(
        Arc::new(StaticProvider::sample()),
        context.tracer(),
        context.latency(),
    );
    let dashboard = Dashboard::new(
        fetcher,
        context.price_gauge(),
        context.tracer(),
        &DashboardConfig::default(),
    );
    dashboard.render_page("GOOG").await;
    dashboard.render_page("AAPL").await;

    let after = scrape(addr, "/metrics").await;
    assert!(after.contains("# TYPE yahoo_api_response_time_ms histogram"));
    assert!(after.contains("yahoo_api_response_time_ms_count{ticker=\"AAPL\"} 1"));
    assert!(after.contains("yahoo_api_response_time_ms_count{ticker=\"GOOG\"} 1"));
    assert!(after.contains("# TYPE stock_price_usd gauge"));
    assert!(after.lines().any(|line| line == "stock_price_usd 153.5"));

    context.shutdown();
}

/// Repeated start requests never fail and bind a single listener
#[tokio::test]
async fn test_repeated_init_binds_once() {
    let context = ObservabilityContext::new(&local_config()).unwrap();
    let addr = started_addr(context.init_once().unwrap());

    for _ in 0..3 {
        assert_eq!(
            context.init_once().unwrap(),
            Some(ExporterStatus::AlreadyRunning(addr))
        );
    }

    // A second context on the same port treats the taken port as success
    let other = ObservabilityContext::new(&MetricsConfig {
        bind_addr: addr,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        other.init_once().unwrap(),
        Some(ExporterStatus::PortInUse(addr))
    );

    let help = scrape(addr, "/").await;
    assert!(help.contains("\"/metrics\""));

    context.shutdown();
}
