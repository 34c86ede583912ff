//! Configuration management
//!
//! Handles loading and validating dashboard configuration from TOML files.
//! Every section has defaults, so an empty file is a valid configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics endpoint
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Metrics server bind address
    #[serde(default = "default_metrics_addr")]
    pub bind_addr: SocketAddr,
    /// HTTP path serving the exposition
    #[serde(default = "default_metrics_path")]
    pub path: String,
    /// Bucket bounds for the provider latency histogram, in milliseconds
    #[serde(default = "default_latency_buckets")]
    pub latency_buckets_ms: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: default_metrics_addr(),
            path: default_metrics_path(),
            latency_buckets_ms: default_latency_buckets(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "json" or "pretty"
    #[serde(default)]
    pub format: LogFormat,
    /// Write closed spans to stderr as JSON lines
    #[serde(default = "default_true")]
    pub span_export: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            span_export: true,
        }
    }
}

/// Which price provider backs the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Static,
}

/// Price provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    /// Upper bound on a single provider call in milliseconds (0 = unbounded)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ProviderConfig {
    /// Get effective call timeout, if any
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_ms > 0).then(|| std::time::Duration::from_millis(self.timeout_ms))
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Ticker used when the input line is blank
    #[serde(default = "default_ticker")]
    pub default_ticker: String,
    /// Number of daily points shown in the chart
    #[serde(default = "default_chart_days")]
    pub chart_days: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_ticker: default_ticker(),
            chart_days: default_chart_days(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_metrics_addr() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 8000)) }
fn default_metrics_path() -> String { "/metrics".to_string() }
fn default_latency_buckets() -> Vec<f64> {
    vec![25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
}
fn default_log_level() -> String { "info".to_string() }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_ticker() -> String { "AAPL".to_string() }
fn default_chart_days() -> u32 { 5 }

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .with_context(|| "Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if !self.metrics.path.starts_with('/') {
            anyhow::bail!("metrics.path must start with '/'");
        }
        if self.metrics.latency_buckets_ms.is_empty() {
            anyhow::bail!("metrics.latency_buckets_ms must not be empty");
        }
        if self
            .metrics
            .latency_buckets_ms
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            anyhow::bail!("metrics.latency_buckets_ms must be strictly increasing");
        }
        if self.dashboard.chart_days == 0 {
            anyhow::bail!("dashboard.chart_days must be > 0");
        }
        Ok(())
    }
}
