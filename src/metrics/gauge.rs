//! Last-value gauge publisher
//!
//! Holds the most recent observation for a gauge. Writers replace it,
//! the registry pulls it when a scrape renders.

use parking_lot::Mutex;

/// Single-cell, last-write-wins gauge value
#[derive(Debug)]
pub struct GaugePublisher {
    name: &'static str,
    value: Mutex<Option<f64>>,
}

impl GaugePublisher {
    /// Create a publisher with no observation yet
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: Mutex::new(None),
        }
    }

    /// Metric name this publisher feeds
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Replace the current value
    pub fn publish(&self, value: f64) {
        *self.value.lock() = Some(value);
    }

    /// Current value, or `None` if nothing was ever published
    pub fn collect(&self) -> Option<f64> {
        *self.value.lock()
    }
}
