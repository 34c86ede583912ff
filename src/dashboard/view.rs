//! Page view model and its terminal rendering

use std::fmt;

use crate::provider::PricePoint;

const BAR_WIDTH: usize = 40;

/// Headline price
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMetric {
    pub label: String,
    pub value: String,
}

impl PriceMetric {
    pub fn new(ticker: &str, price: f64) -> Self {
        Self {
            label: format!("Current Price of {}", ticker),
            value: format!("${:.2}", price),
        }
    }
}

/// Close-price line chart data
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub points: Vec<PricePoint>,
}

impl Chart {
    pub fn new(ticker: &str, days: u32, points: Vec<PricePoint>) -> Self {
        Self {
            title: format!("{} - Last {} Days", ticker, days),
            points,
        }
    }
}

impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;

        let low = self.points.iter().map(|p| p.close).fold(f64::INFINITY, f64::min);
        let high = self.points.iter().map(|p| p.close).fold(f64::NEG_INFINITY, f64::max);
        let span = high - low;

        for point in &self.points {
            // Flat series draw half-width bars
            let ratio = if span > 0.0 { (point.close - low) / span } else { 0.5 };
            let width = 1 + (ratio * (BAR_WIDTH - 1) as f64).round() as usize;
            writeln!(f, "  {}  {:>10.2}  {}", point.date, point.close, "#".repeat(width))?;
        }
        Ok(())
    }
}

/// Everything one page load shows
#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    /// No ticker entered
    Idle,
    /// Price found; the chart may still be missing
    Quote {
        metric: PriceMetric,
        chart: Option<Chart>,
        warning: Option<String>,
    },
    /// Nothing could be fetched
    Unavailable { message: String },
}

impl PageView {
    pub fn unavailable() -> Self {
        PageView::Unavailable {
            message: "Could not fetch stock price. Please check the ticker symbol.".to_string(),
        }
    }

    /// Headline value such as `$153.50`
    pub fn price_text(&self) -> Option<&str> {
        match self {
            PageView::Quote { metric, .. } => Some(&metric.value),
            _ => None,
        }
    }

    pub fn chart(&self) -> Option<&Chart> {
        match self {
            PageView::Quote { chart, .. } => chart.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageView::Idle => writeln!(f, "Enter a stock ticker symbol (e.g. AAPL, GOOG, TSLA)"),
            PageView::Quote {
                metric,
                chart,
                warning,
            } => {
                writeln!(f, "{}: {}", metric.label, metric.value)?;
                if let Some(warning) = warning {
                    writeln!(f, "warning: {}", warning)?;
                }
                if let Some(chart) = chart {
                    write!(f, "{}", chart)?;
                }
                Ok(())
            }
            PageView::Unavailable { message } => writeln!(f, "error: {}", message),
        }
    }
}
