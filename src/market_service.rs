// =============================================================================
// Market Data Service — the fetch contract the pipeline depends on
// =============================================================================
//
// Four independent fetches: pairs, currency symbols, currency labels and a
// batched live ticker snapshot.  The pipeline knows nothing about transport or
// decoding; `bitfinex::BitfinexClient` is the production implementation.
// =============================================================================

use anyhow::Result;
use async_trait::async_trait;

use crate::market_data::{CurrencyEntry, LiveSnapshot, TradingPair};
use crate::types::PlatformStatus;

#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Every tradable pair ticker, in exchange order.
    async fn fetch_pairs(&self) -> Result<Vec<TradingPair>>;

    /// Currency code → display code table.
    async fn fetch_symbols(&self) -> Result<Vec<CurrencyEntry>>;

    /// Currency code → display name table.
    async fn fetch_labels(&self) -> Result<Vec<CurrencyEntry>>;

    /// One batched snapshot for `symbols` (each already marker-prefixed).
    /// Result order follows the request order.
    async fn fetch_tickers(&self, symbols: &[String]) -> Result<Vec<LiveSnapshot>>;
}

/// Source of the exchange's operative / maintenance flag.
#[async_trait]
pub trait PlatformStatusSource: Send + Sync {
    async fn fetch_platform_status(&self) -> Result<PlatformStatus>;
}

// =============================================================================
// Test double
// =============================================================================
