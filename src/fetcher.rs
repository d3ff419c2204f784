//! Quote provider access.
//!
//! `QuoteFetcher` is the seam between the allocation engine and whatever
//! serves prices. `HttpQuoteFetcher` talks to an IEX-Cloud style batch
//! endpoint:
//!
//! ```text
//! GET {api_url}/stock/market/batch?symbols=AAPL,MSFT&types=quote,stats&token=...
//! ```
//!
//! The response maps each symbol to a `quote` and `stats` object. Any
//! non-success status fails the whole batch.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;

use crate::config::Config;
use crate::error::FetchError;
use crate::stocks::{Horizon, QuoteRecord, Symbol};

/// Records keyed by symbol for one batch.
pub type QuoteMap = HashMap<Symbol, QuoteRecord>;

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<QuoteMap, FetchError>> + Send + 'a>>;

/// Resolves one batch of symbols to quote records.
///
/// Implementations either return a map for the batch or fail it as a unit.
/// Leaving a symbol out of the map is allowed; the caller records it as
/// dropped.
pub trait QuoteFetcher: Send + Sync {
    fn fetch<'a>(&'a self, batch: &'a [Symbol]) -> FetchFuture<'a>;
}

pub struct HttpQuoteFetcher {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
    timeout: Duration,
}

impl HttpQuoteFetcher {
    pub fn new(api_url: &str, api_token: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|source| FetchError::Transport {
                first: String::from("<client>"),
                source,
            })?;

        Ok(HttpQuoteFetcher {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(&config.api_url, &config.api_token, config.request_timeout())
    }

    async fn fetch_batch(&self, batch: &[Symbol]) -> Result<QuoteMap, FetchError> {
        let first = batch.first().map(Symbol::to_string).unwrap_or_default();
        let symbols = batch.iter().map(Symbol::as_str).collect::<Vec<_>>().join(",");
        let url = format!("{}/stock/market/batch", self.api_url);

        debug!("requesting {} symbols starting at {}", batch.len(), first);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbols", symbols.as_str()),
                ("types", "quote,stats"),
                ("token", self.api_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(&first, e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport_error(&first, e))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                first,
                status: status.as_u16(),
                body: text,
            });
        }

        parse_batch_payload(&text)
    }

    /// The request URL carries the API token, so it is stripped from the
    /// error before it can reach logs or stderr.
    fn transport_error(&self, first: &str, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport {
                first: first.to_string(),
                source: source.without_url(),
            }
        }
    }
}

impl QuoteFetcher for HttpQuoteFetcher {
    fn fetch<'a>(&'a self, batch: &'a [Symbol]) -> FetchFuture<'a> {
        Box::pin(self.fetch_batch(batch))
    }
}

#[derive(Debug, Deserialize)]
struct BatchEntry {
    #[serde(default)]
    quote: Option<QuotePayload>,
    #[serde(default)]
    stats: Option<StatsPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotePayload {
    latest_price: Option<f64>,
    market_cap: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsPayload {
    year1_change_percent: Option<f64>,
    month6_change_percent: Option<f64>,
    month3_change_percent: Option<f64>,
    month1_change_percent: Option<f64>,
    marketcap: Option<f64>,
}

/// Decode a batch response body into quote records.
///
/// Provider nulls stay `None`. A missing price becomes NaN so that universe
/// validation drops the row as having an invalid price.
pub fn parse_batch_payload(text: &str) -> Result<QuoteMap, FetchError> {
    let entries: HashMap<String, BatchEntry> = serde_json::from_str(text)?;
    let mut records = HashMap::with_capacity(entries.len());

    for (key, entry) in entries {
        let symbol = match Symbol::parse(&key) {
            Ok(symbol) => symbol,
            Err(e) => {
                debug!("skipping provider key '{}': {}", key, e);
                continue;
            }
        };

        let quote = entry.quote.unwrap_or_default();
        let stats = entry.stats.unwrap_or_default();

        let mut record = QuoteRecord::new(symbol.clone(), quote.latest_price.unwrap_or(f64::NAN));
        record.returns.set(Horizon::OneYear, stats.year1_change_percent);
        record.returns.set(Horizon::SixMonth, stats.month6_change_percent);
        record.returns.set(Horizon::ThreeMonth, stats.month3_change_percent);
        record.returns.set(Horizon::OneMonth, stats.month1_change_percent);
        record.market_cap = quote.market_cap.or(stats.marketcap);

        records.insert(symbol, record);
    }

    Ok(records)
}
