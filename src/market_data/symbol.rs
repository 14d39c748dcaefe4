// =============================================================================
// Reference data — pairs, currency tables and joined pair descriptors
// =============================================================================

use serde::{Deserialize, Serialize};

/// One currency as the exchange knows it versus how it is shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub api_symbol: String,
    pub display_symbol: String,
    pub display_name: String,
}

impl SymbolInfo {
    pub fn new(api_symbol: &str, display_symbol: &str, display_name: &str) -> Self {
        Self {
            api_symbol: api_symbol.to_uppercase(),
            display_symbol: display_symbol.to_uppercase(),
            display_name: display_name.to_uppercase(),
        }
    }
}

/// A tradable pair joined with display data for both of its currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDescriptor {
    pub pair_ticker: String,
    pub base: SymbolInfo,
    pub quote: SymbolInfo,
}

impl PairDescriptor {
    pub fn new(pair_ticker: &str, base: SymbolInfo, quote: SymbolInfo) -> Self {
        Self {
            pair_ticker: pair_ticker.to_uppercase(),
            base,
            quote,
        }
    }

    /// The five fields a board query is matched against.
    pub fn searchable_fields(&self) -> [&str; 5] {
        [
            &self.base.display_symbol,
            &self.base.display_name,
            &self.quote.display_symbol,
            &self.quote.display_name,
            &self.pair_ticker,
        ]
    }
}

/// Raw pair ticker from the exchange's pair list, e.g. `BTCUSD` or
/// `TESTBTC:TESTUSD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingPair {
    ticker: String,
}

impl TradingPair {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Base currency code: the part before `:`, or the first three
    /// characters. Empty for tickers too short to split.
    pub fn base(&self) -> &str {
        self.split().0
    }

    /// Quote currency code: the part after the first `:`, or everything after
    /// the third character.
    pub fn quote(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        if self.ticker.contains(':') {
            let mut parts = self.ticker.split(':');
            let base = parts.next().unwrap_or_default();
            let quote = parts.next().unwrap_or_default();
            return (base, quote);
        }

        match self.ticker.char_indices().nth(3) {
            Some((mid, _)) => self.ticker.split_at(mid),
            None if self.ticker.chars().count() == 3 => (&self.ticker, ""),
            None => ("", ""),
        }
    }
}

/// One row of the currency symbol or label table: an exchange code and the
/// value mapped to it (display code or display name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyEntry {
    pub code: String,
    pub value: String,
}

impl CurrencyEntry {
    pub fn new(code: &str, value: &str) -> Self {
        Self {
            code: code.to_uppercase(),
            value: value.to_uppercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_info_uppercases_all_fields() {
        let info = SymbolInfo::new("BTc", "btc", "BItcoIN");
        assert_eq!(info, SymbolInfo::new("BTC", "BTC", "BITCOIN"));
    }

    #[test]
    fn pair_splits_three_three() {
        let pair = TradingPair::new("BtcuSd");
        assert_eq!(pair.ticker(), "BTCUSD");
        assert_eq!(pair.base(), "BTC");
        assert_eq!(pair.quote(), "USD");
    }

    #[test]
    fn pair_splits_on_colon() {
        let pair = TradingPair::new("testbtc:testusd");
        assert_eq!(pair.base(), "TESTBTC");
        assert_eq!(pair.quote(), "TESTUSD");

        let pair = TradingPair::new("DUSK:USD");
        assert_eq!(pair.base(), "DUSK");
        assert_eq!(pair.quote(), "USD");
    }

    #[test]
    fn pair_with_long_quote_keeps_remainder() {
        let pair = TradingPair::new("BTCUST");
        assert_eq!(pair.quote(), "UST");

        let pair = TradingPair::new("ETHUSDT");
        assert_eq!(pair.base(), "ETH");
        assert_eq!(pair.quote(), "USDT");
    }

    #[test]
    fn short_pairs_yield_empty_codes() {
        let pair = TradingPair::new("BT");
        assert_eq!(pair.base(), "");
        assert_eq!(pair.quote(), "");

        let pair = TradingPair::new("BTC");
        assert_eq!(pair.base(), "BTC");
        assert_eq!(pair.quote(), "");
    }

    #[test]
    fn searchable_fields_cover_both_sides_and_ticker() {
        let descriptor = PairDescriptor::new(
            "btcusd",
            SymbolInfo::new("BTC", "BTC", "Bitcoin"),
            SymbolInfo::new("USD", "USD", "US Dollar"),
        );
        assert_eq!(
            descriptor.searchable_fields(),
            ["BTC", "BITCOIN", "USD", "US DOLLAR", "BTCUSD"]
        );
    }
}
