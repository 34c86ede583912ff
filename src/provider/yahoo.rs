//! Yahoo Finance provider
//!
//! Fetches daily closes through the chart API. An unknown symbol comes back
//! as "no quotes", which is reported as an empty series.

use async_trait::async_trait;
use chrono::DateTime;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use super::{keep_latest, PricePoint, PriceProvider, ProviderError};

const PROVIDER_ID: &str = "YAHOO";

/// Yahoo Finance daily price provider
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

impl YahooProvider {
    pub fn new() -> Result<Self, ProviderError> {
        let connector = yahoo::YahooConnector::new().map_err(|e| ProviderError::Upstream {
            provider: PROVIDER_ID,
            message: format!("Failed to initialize Yahoo connector: {}", e),
        })?;
        Ok(Self { connector })
    }

    /// Smallest chart range covering `lookback_days` trading days
    fn range_for(lookback_days: u32) -> &'static str {
        match lookback_days {
            0 | 1 => "1d",
            2..=5 => "5d",
            6..=21 => "1mo",
            22..=63 => "3mo",
            64..=126 => "6mo",
            127..=252 => "1y",
            253..=504 => "2y",
            505..=1260 => "5y",
            _ => "max",
        }
    }

    fn to_point(quote: &yahoo::Quote) -> Result<PricePoint, ProviderError> {
        let date = DateTime::from_timestamp(quote.timestamp as i64, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ProviderError::InvalidData(format!("Invalid timestamp: {}", quote.timestamp)))?;

        if !quote.close.is_finite() {
            return Err(ProviderError::InvalidData(format!(
                "Invalid close price {} on {}",
                quote.close, date
            )));
        }

        Ok(PricePoint {
            date,
            close: quote.close,
        })
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn daily_closes(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let range = Self::range_for(lookback_days);
        debug!(ticker, range, "Requesting daily closes from Yahoo");

        let response = match self.connector.get_quote_range(ticker, "1d", range).await {
            Ok(response) => response,
            Err(yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) => return Ok(vec![]),
            Err(e) => {
                return Err(ProviderError::Upstream {
                    provider: PROVIDER_ID,
                    message: e.to_string(),
                })
            }
        };

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) => return Ok(vec![]),
            Err(e) => {
                return Err(ProviderError::Upstream {
                    provider: PROVIDER_ID,
                    message: e.to_string(),
                })
            }
        };

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|quote| match Self::to_point(quote) {
                Ok(point) => Some(point),
                Err(e) => {
                    warn!(ticker, error = %e, "Skipping unusable quote");
                    None
                }
            })
            .collect();

        Ok(keep_latest(points, lookback_days))
    }
}
