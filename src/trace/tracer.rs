//! Span factory
//!
//! Spans are ordinary `tracing` spans, so nesting follows the current span
//! of the executing thread or task. No parent handles are passed around.

use std::fmt;
use std::future::Future;
use tracing::instrument::Instrumented;
use tracing::{field, info_span, Span};

use super::layer::{ERROR_FIELD, STATUS_FIELD};

/// Creates named, scoped spans
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracer;

impl Tracer {
    pub fn new() -> Self {
        Self
    }

    /// Start a span named `name` as a child of the current span
    pub fn start_span(&self, name: &str) -> ScopedSpan {
        let span = info_span!(
            "tickerscope.span",
            otel.name = name,
            ticker = field::Empty,
            status = field::Empty,
            error = field::Empty
        );
        ScopedSpan { span }
    }
}

/// Handle to an open span. The span closes once every handle and every
/// future instrumented with it has been dropped.
#[derive(Debug, Clone)]
pub struct ScopedSpan {
    span: Span,
}

impl ScopedSpan {
    /// Attach the ticker this span works on
    pub fn with_ticker(self, ticker: &str) -> Self {
        self.span.record("ticker", ticker);
        self
    }

    /// Mark the span as failed with `err` as the cause
    pub fn fail<E: fmt::Display + ?Sized>(&self, err: &E) {
        self.span.record(STATUS_FIELD, "error");
        self.span.record(ERROR_FIELD, field::display(err));
    }

    /// Make this the current span until the guard drops
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Run `future` inside this span
    pub fn wrap<F: Future>(&self, future: F) -> Instrumented<F> {
        tracing::Instrument::instrument(future, self.span.clone())
    }
}
