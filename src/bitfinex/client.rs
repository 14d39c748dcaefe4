// =============================================================================
// Bitfinex REST API Client — public v2 endpoints
// =============================================================================
//
// Only unauthenticated endpoints are used, so no request signing:
//
//   GET /conf/pub:list:pair:exchange   tradable pairs     [["BTCUSD", ...]]
//   GET /conf/pub:map:currency:sym     code -> display    [[["AAA","TESTAAA"], ...]]
//   GET /conf/pub:map:currency:label   code -> name       [[["BTC","Bitcoin"], ...]]
//   GET /tickers?symbols=tBTCUSD,...   live tickers       [[...], [...]]
//   GET /platform/status               operative flag     [1]
//
// Conf responses wrap their payload in a one-element outer array.  Malformed
// rows inside a conf payload are skipped; a malformed ticker fails the call.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::market_data::{CurrencyEntry, LiveSnapshot, TradingPair};
use crate::market_service::{MarketDataService, PlatformStatusSource};
use crate::types::PlatformStatus;

const PAIRS_PATH: &str = "/conf/pub:list:pair:exchange";
const SYMBOLS_PATH: &str = "/conf/pub:map:currency:sym";
const LABELS_PATH: &str = "/conf/pub:map:currency:label";
const TICKERS_PATH: &str = "/tickers";
const PLATFORM_STATUS_PATH: &str = "/platform/status";

/// Client for the public Bitfinex v2 REST API.
#[derive(Clone)]
pub struct BitfinexClient {
    base_url: String,
    client: reqwest::Client,
}

impl BitfinexClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a client against `base_url` (e.g. `https://api-pub.bitfinex.com/v2`)
    /// with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "BitfinexClient initialised");

        Ok(Self { base_url, client })
    }

    /// Create a client that re-uses an existing HTTP client.
    #[cfg(test)]
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    /// GET `path_and_query` and parse the body as JSON. Non-2xx responses are
    /// errors carrying the status and raw body.
    async fn get_json(&self, path_and_query: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path_and_query);

        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .with_context(|| format!("GET {path_and_query} request failed"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("failed to read {path_and_query} response body"))?;

        if !status.is_success() {
            anyhow::bail!("Bitfinex GET {} returned {}: {}", path_and_query, status, body);
        }

        serde_json::from_str(&body)
            .with_context(|| format!("failed to parse {path_and_query} response as JSON"))
    }

    // -------------------------------------------------------------------------
    // Endpoints
    // -------------------------------------------------------------------------

    #[instrument(skip(self), name = "bitfinex::get_pairs")]
    pub async fn get_pairs(&self) -> Result<Vec<TradingPair>> {
        let body = self.get_json(PAIRS_PATH).await?;
        let pairs = parse_pairs(&body)?;
        debug!(count = pairs.len(), "pairs fetched");
        Ok(pairs)
    }

    #[instrument(skip(self), name = "bitfinex::get_symbols")]
    pub async fn get_symbols(&self) -> Result<Vec<CurrencyEntry>> {
        let body = self.get_json(SYMBOLS_PATH).await?;
        let symbols = parse_currency_map(&body).context("invalid currency symbol map")?;
        debug!(count = symbols.len(), "currency symbols fetched");
        Ok(symbols)
    }

    #[instrument(skip(self), name = "bitfinex::get_labels")]
    pub async fn get_labels(&self) -> Result<Vec<CurrencyEntry>> {
        let body = self.get_json(LABELS_PATH).await?;
        let labels = parse_currency_map(&body).context("invalid currency label map")?;
        debug!(count = labels.len(), "currency labels fetched");
        Ok(labels)
    }

    /// GET /tickers for `symbols` (marker-prefixed, e.g. `tBTCUSD`).
    #[instrument(skip(self, symbols), fields(requested = symbols.len()), name = "bitfinex::get_tickers")]
    pub async fn get_tickers(&self, symbols: &[String]) -> Result<Vec<LiveSnapshot>> {
        let path = format!("{}?symbols={}", TICKERS_PATH, symbols.join(","));
        let body = self.get_json(&path).await?;
        let tickers = parse_tickers(&body)?;
        debug!(count = tickers.len(), "tickers fetched");
        Ok(tickers)
    }

    #[instrument(skip(self), name = "bitfinex::get_platform_status")]
    pub async fn get_platform_status(&self) -> Result<PlatformStatus> {
        let body = self.get_json(PLATFORM_STATUS_PATH).await?;
        parse_platform_status(&body)
    }
}

#[async_trait]
impl MarketDataService for BitfinexClient {
    async fn fetch_pairs(&self) -> Result<Vec<TradingPair>> {
        self.get_pairs().await
    }

    async fn fetch_symbols(&self) -> Result<Vec<CurrencyEntry>> {
        self.get_symbols().await
    }

    async fn fetch_labels(&self) -> Result<Vec<CurrencyEntry>> {
        self.get_labels().await
    }

    async fn fetch_tickers(&self, symbols: &[String]) -> Result<Vec<LiveSnapshot>> {
        self.get_tickers(symbols).await
    }
}

#[async_trait]
impl PlatformStatusSource for BitfinexClient {
    async fn fetch_platform_status(&self) -> Result<PlatformStatus> {
        self.get_platform_status().await
    }
}

impl std::fmt::Debug for BitfinexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitfinexClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Response decoding
// =============================================================================

/// Unwrap the one-element outer array conf endpoints respond with.
fn conf_payload(body: &Value) -> Result<&Vec<Value>> {
    body.as_array()
        .and_then(|outer| outer.first())
        .and_then(Value::as_array)
        .context("conf response is not a nested array")
}

fn parse_pairs(body: &Value) -> Result<Vec<TradingPair>> {
    let payload = conf_payload(body).context("invalid pair list")?;
    Ok(payload
        .iter()
        .filter_map(Value::as_str)
        .map(TradingPair::new)
        .collect())
}

fn parse_currency_map(body: &Value) -> Result<Vec<CurrencyEntry>> {
    let payload = conf_payload(body)?;
    Ok(payload
        .iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            let code = row.first()?.as_str()?;
            let value = row.get(1)?.as_str()?;
            Some(CurrencyEntry::new(code, value))
        })
        .collect())
}

fn parse_tickers(body: &Value) -> Result<Vec<LiveSnapshot>> {
    let raw = body.as_array().context("tickers response is not an array")?;
    raw.iter()
        .enumerate()
        .map(|(i, entry)| {
            LiveSnapshot::from_wire(entry).with_context(|| format!("invalid ticker at index {i}"))
        })
        .collect()
}

fn parse_platform_status(body: &Value) -> Result<PlatformStatus> {
    let code = body
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(Value::as_i64)
        .context("platform status response is not [code]")?;
    PlatformStatus::from_code(code)
        .with_context(|| format!("unknown platform status code {code}"))
}
