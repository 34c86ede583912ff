//! Tickerscope - Entry Point
//!
//! Renders one dashboard page per ticker and serves Prometheus metrics.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info};

use tickerscope::config::ProviderKind;
use tickerscope::provider::{PriceProvider, StaticProvider, YahooProvider};
use tickerscope::{Config, Dashboard, ObservabilityContext, QuoteFetcher, VERSION};

/// Instrumented stock price dashboard
#[derive(Parser, Debug)]
#[command(name = "tickerscope", version, about)]
struct Args {
    /// Path to TOML config file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use built-in sample data instead of Yahoo Finance
    #[arg(long)]
    offline: bool,

    /// Keep serving metrics after the last page until interrupted
    #[arg(long)]
    serve: bool,

    /// Tickers to render; reads one per line from stdin when empty
    tickers: Vec<String>,
}

/// Application entry point
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::default(),
    };

    // Initialize tracing/logging
    tickerscope::util::init_tracing(&config.logging)?;

    info!(version = VERSION, config_path = ?args.config, "Starting Tickerscope");

    let observability = ObservabilityContext::new(&config.metrics)
        .context("Failed to build metrics registry")?;
    if let Some(status) = observability.init_once()? {
        info!(?status, path = %config.metrics.path, "Metrics endpoint ready");
    }

    let provider: Arc<dyn PriceProvider> = if args.offline || config.provider.kind == ProviderKind::Static {
        Arc::new(StaticProvider::sample())
    } else {
        Arc::new(YahooProvider::new()?)
    };
    info!(provider = provider.id(), "Price provider selected");

    let fetcher = QuoteFetcher::new(provider, observability.tracer(), observability.latency())
        .with_timeout(config.provider.timeout());
    let dashboard = Dashboard::new(
        fetcher,
        observability.price_gauge(),
        observability.tracer(),
        &config.dashboard,
    );

    if args.tickers.is_empty() {
        run_interactive(&dashboard, &config.dashboard.default_ticker).await?;
    } else {
        for ticker in &args.tickers {
            println!("{}", dashboard.render_page(ticker).await);
        }
    }

    if args.serve {
        info!("Serving metrics, press Ctrl+C to exit");
        shutdown_signal().await;
    }

    observability.shutdown();
    info!("Tickerscope stopped");
    Ok(())
}

/// Render a page for every line read from stdin
async fn run_interactive(dashboard: &Dashboard, default_ticker: &str) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("ticker [{}]> ", default_ticker);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            return Ok(());
        };
        let input = line.trim();
        let ticker = if input.is_empty() { default_ticker } else { input };

        println!("{}", dashboard.render_page(ticker).await);
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
