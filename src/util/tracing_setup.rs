//! Tracing/logging initialization

use anyhow::Result;
use std::io;
use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::trace::{JsonLinesSink, SpanExportLayer};

/// Initialize the tracing subscriber based on configuration
///
/// Logs go to stderr so stdout carries only page output.
/// Log output honours `RUST_LOG` over the configured level. Span export is
/// filtered separately so closed spans are exported whatever the log level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let span_export = config.span_export.then(|| {
        SpanExportLayer::new(JsonLinesSink::stderr())
            .with_filter(Targets::new().with_target(env!("CARGO_CRATE_NAME"), Level::TRACE))
    });

    let subscriber = tracing_subscriber::registry().with(span_export);

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter);
            subscriber.with(fmt_layer).try_init()?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(filter);
            subscriber.with(fmt_layer).try_init()?;
        }
    }

    Ok(())
}
