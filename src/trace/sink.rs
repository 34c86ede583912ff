//! Span export sinks
//!
//! A sink receives one [`SpanRecord`] per closed span. Call sites never see
//! the sink, so a network exporter can replace the console one freely.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;

/// Completion status of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    #[default]
    Ok,
    Error,
}

/// A closed span
#[derive(Debug, Clone, Serialize)]
pub struct SpanRecord {
    pub name: String,
    /// Names from the root span down to this one
    pub path: Vec<String>,
    pub start: DateTime<Utc>,
    pub duration_ms: f64,
    pub status: SpanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl SpanRecord {
    /// Nesting depth, 0 for a root span
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Name of the enclosing span, if any
    pub fn parent(&self) -> Option<&str> {
        self.path.iter().rev().nth(1).map(String::as_str)
    }
}

/// Destination for closed spans
pub trait SpanSink: Send + Sync + 'static {
    fn export(&self, record: &SpanRecord);
}

impl<T: SpanSink + ?Sized> SpanSink for Arc<T> {
    fn export(&self, record: &SpanRecord) {
        (**self).export(record)
    }
}

/// Writes each span as one JSON line
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl JsonLinesSink<io::Stderr> {
    /// Console sink on stderr
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send + 'static> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send + 'static> SpanSink for JsonLinesSink<W> {
    fn export(&self, record: &SpanRecord) {
        let mut writer = self.writer.lock();
        // Export failures must never reach the instrumented code
        if serde_json::to_writer(&mut *writer, record).is_ok() {
            let _ = writer.write_all(b"\n");
            let _ = writer.flush();
        }
    }
}

/// Keeps closed spans in memory
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<SpanRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans closed so far, in close order
    pub fn records(&self) -> Vec<SpanRecord> {
        self.records.lock().clone()
    }

    /// First closed span with the given name
    pub fn find(&self, name: &str) -> Option<SpanRecord> {
        self.records.lock().iter().find(|record| record.name == name).cloned()
    }
}

impl SpanSink for MemorySink {
    fn export(&self, record: &SpanRecord) {
        self.records.lock().push(record.clone());
    }
}
