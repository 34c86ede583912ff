//! `tracing` layer that turns closed spans into [`SpanRecord`]s

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::sink::{SpanRecord, SpanSink, SpanStatus};

/// Field overriding the span's static name
pub(crate) const NAME_FIELD: &str = "otel.name";
pub(crate) const STATUS_FIELD: &str = "status";
pub(crate) const ERROR_FIELD: &str = "error";

/// Exports every closed span to a [`SpanSink`]
pub struct SpanExportLayer {
    sink: Arc<dyn SpanSink>,
}

impl SpanExportLayer {
    pub fn new(sink: impl SpanSink) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }
}

/// Per-span state kept in the registry's extensions while the span is open
struct OpenSpan {
    name: String,
    path: Vec<String>,
    started_at: DateTime<Utc>,
    start: Instant,
    fields: SpanFields,
}

#[derive(Default)]
struct SpanFields {
    name: Option<String>,
    status: SpanStatus,
    error: Option<String>,
    attributes: BTreeMap<String, String>,
}

impl SpanFields {
    fn store(&mut self, field: &str, value: String) {
        match field {
            NAME_FIELD => self.name = Some(value),
            STATUS_FIELD => {
                if value.eq_ignore_ascii_case("error") {
                    self.status = SpanStatus::Error;
                }
            }
            ERROR_FIELD => {
                self.status = SpanStatus::Error;
                self.error = Some(value);
            }
            _ => {
                self.attributes.insert(field.to_string(), value);
            }
        }
    }
}

impl Visit for SpanFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field.name(), format!("{:?}", value));
    }
}

impl<S> Layer<S> for SpanExportLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut fields = SpanFields::default();
        attrs.record(&mut fields);
        let name = fields
            .name
            .take()
            .unwrap_or_else(|| span.name().to_string());

        let mut path = match span.parent() {
            Some(parent) => {
                let extensions = parent.extensions();
                let parent_path = extensions.get::<OpenSpan>().map(|open| open.path.clone());
                parent_path.unwrap_or_default()
            }
            None => Vec::new(),
        };
        path.push(name.clone());

        span.extensions_mut().insert(OpenSpan {
            name,
            path,
            started_at: Utc::now(),
            start: Instant::now(),
            fields,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(open) = extensions.get_mut::<OpenSpan>() {
            values.record(&mut open.fields);
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let Some(open) = span.extensions_mut().remove::<OpenSpan>() else {
            return;
        };

        let record = SpanRecord {
            name: open.name,
            path: open.path,
            start: open.started_at,
            duration_ms: open.start.elapsed().as_secs_f64() * 1000.0,
            status: open.fields.status,
            error: open.fields.error,
            attributes: open.fields.attributes,
        };
        self.sink.export(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::MemorySink;
    use tracing::{field, info_span};
    use tracing_subscriber::prelude::*;

    fn with_sink<F: FnOnce()>(f: F) -> MemorySink {
        let sink = MemorySink::new();
        let subscriber = tracing_subscriber::registry().with(SpanExportLayer::new(sink.clone()));
        tracing::subscriber::with_default(subscriber, f);
        sink
    }

    #[test]
    fn test_nested_spans_record_path() {
        let sink = with_sink(|| {
            let outer = info_span!("outer");
            let _outer = outer.enter();
            let inner = info_span!("inner", ticker = "AAPL");
            let _inner = inner.enter();
        });

        let records = sink.records();
        assert_eq!(records.len(), 2);

        // Inner closes first
        assert_eq!(records[0].name, "inner");
        assert_eq!(records[0].path, vec!["outer", "inner"]);
        assert_eq!(records[0].attributes.get("ticker").map(String::as_str), Some("AAPL"));
        assert_eq!(records[1].path, vec!["outer"]);
        assert!(records.iter().all(|r| r.status == SpanStatus::Ok));
    }

    #[test]
    fn test_name_override_and_late_error() {
        let sink = with_sink(|| {
            let span = info_span!("tickerscope.span", otel.name = "fetch_stock_price", error = field::Empty);
            span.record("error", "provider unavailable");
        });

        let record = sink.find("fetch_stock_price").unwrap();
        assert_eq!(record.status, SpanStatus::Error);
        assert_eq!(record.error.as_deref(), Some("provider unavailable"));
        assert!(record.attributes.is_empty());
    }
}
