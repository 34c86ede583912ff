//! Span tracing
//!
//! Scoped spans built on `tracing`, plus a subscriber layer that exports
//! each closed span (name, nesting path, duration, status) to a sink.

mod layer;
mod sink;
mod tracer;

pub use layer::SpanExportLayer;
pub use sink::{JsonLinesSink, MemorySink, SpanRecord, SpanSink, SpanStatus};
pub use tracer::{ScopedSpan, Tracer};
