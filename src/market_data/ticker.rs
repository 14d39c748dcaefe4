// =============================================================================
// Live ticker snapshots — spot and funding instruments
// =============================================================================
//
// Bitfinex returns every ticker as a positional JSON array whose layout
// depends on the instrument kind, which is encoded as the first character of
// the symbol:
//
//   tBTCUSD  spot     [SYMBOL, BID, BID_SIZE, ASK, ASK_SIZE, DAILY_CHANGE,
//                      DAILY_CHANGE_RELATIVE, LAST_PRICE, VOLUME, HIGH, LOW]
//   fUSD     funding  [SYMBOL, FRR, BID, BID_PERIOD, BID_SIZE, ASK,
//                      ASK_PERIOD, ASK_SIZE, DAILY_CHANGE,
//                      DAILY_CHANGE_RELATIVE, LAST_PRICE, VOLUME, HIGH, LOW,
//                      _, _, FRR_AMOUNT_AVAILABLE]
//
// Funding-only fields decode leniently; the shared numeric fields must be
// present.  An unknown marker is a parse error.
// =============================================================================

use anyhow::{bail, Context, Result};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

/// Marker prefixed to spot instrument symbols in ticker requests.
pub const SPOT_MARKER: char = 't';

/// Instrument kind encoded by the symbol's first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    Spot,
    Funding,
}

impl InstrumentKind {
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker.to_ascii_uppercase() {
            'T' => Some(Self::Spot),
            'F' => Some(Self::Funding),
            _ => None,
        }
    }

    fn from_symbol(symbol: &str) -> Result<Self> {
        let marker = symbol.chars().next().context("ticker symbol is empty")?;
        match Self::from_marker(marker) {
            Some(kind) => Ok(kind),
            None => bail!("unknown instrument marker '{marker}' in ticker symbol {symbol}"),
        }
    }
}

/// Fields only funding tickers carry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FundingFields {
    pub flash_return_rate: Option<f64>,
    pub bid_period: Option<i64>,
    pub ask_period: Option<i64>,
    pub frr_amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instrument {
    Spot,
    Funding(FundingFields),
}

/// Price and volume fields shared by every instrument kind.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickerFields {
    pub bid_price: f64,
    pub bid_size: f64,
    pub ask_price: f64,
    pub ask_size: f64,
    pub daily_change: f64,
    pub daily_change_relative: f64,
    pub last_price: f64,
    pub volume: f64,
    pub high: f64,
    pub low: f64,
}

/// One instrument's live market data from a single poll.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSnapshot {
    symbol: String,
    instrument: Instrument,
    fields: TickerFields,
}

impl LiveSnapshot {
    pub fn spot(symbol: &str, fields: TickerFields) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            instrument: Instrument::Spot,
            fields,
        }
    }

    pub fn funding(symbol: &str, funding: FundingFields, fields: TickerFields) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            instrument: Instrument::Funding(funding),
            fields,
        }
    }

    /// Marker-prefixed, uppercased symbol (e.g. `TBTCUSD`).
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Symbol with the instrument marker stripped; compared against
    /// [`PairDescriptor::pair_ticker`](super::PairDescriptor).
    pub fn pair_ticker(&self) -> &str {
        let mut chars = self.symbol.chars();
        chars.next();
        chars.as_str()
    }

    pub fn fields(&self) -> &TickerFields {
        &self.fields
    }

    pub fn is_funding_instrument(&self) -> bool {
        matches!(self.instrument, Instrument::Funding(_))
    }

    pub fn flash_return_rate(&self) -> Option<f64> {
        self.funding_fields().and_then(|f| f.flash_return_rate)
    }

    pub fn bid_period(&self) -> Option<i64> {
        self.funding_fields().and_then(|f| f.bid_period)
    }

    pub fn ask_period(&self) -> Option<i64> {
        self.funding_fields().and_then(|f| f.ask_period)
    }

    pub fn frr_amount(&self) -> Option<f64> {
        self.funding_fields().and_then(|f| f.frr_amount)
    }

    fn funding_fields(&self) -> Option<&FundingFields> {
        match &self.instrument {
            Instrument::Funding(fields) => Some(fields),
            Instrument::Spot => None,
        }
    }

    /// Decode one positional ticker array from the `/tickers` response.
    pub fn from_wire(value: &Value) -> Result<Self> {
        let arr = value.as_array().context("ticker entry is not an array")?;

        let symbol = arr
            .first()
            .and_then(Value::as_str)
            .context("ticker entry missing symbol")?;

        match InstrumentKind::from_symbol(symbol)? {
            InstrumentKind::Spot => {
                let fields = TickerFields {
                    bid_price: number_at(arr, 1, "BID")?,
                    bid_size: number_at(arr, 2, "BID_SIZE")?,
                    ask_price: number_at(arr, 3, "ASK")?,
                    ask_size: number_at(arr, 4, "ASK_SIZE")?,
                    daily_change: number_at(arr, 5, "DAILY_CHANGE")?,
                    daily_change_relative: number_at(arr, 6, "DAILY_CHANGE_RELATIVE")?,
                    last_price: number_at(arr, 7, "LAST_PRICE")?,
                    volume: number_at(arr, 8, "VOLUME")?,
                    high: number_at(arr, 9, "HIGH")?,
                    low: number_at(arr, 10, "LOW")?,
                };
                Ok(Self::spot(symbol, fields))
            }
            InstrumentKind::Funding => {
                let funding = FundingFields {
                    flash_return_rate: arr.get(1).and_then(Value::as_f64),
                    bid_period: arr.get(3).and_then(Value::as_i64),
                    ask_period: arr.get(6).and_then(Value::as_i64),
                    frr_amount: arr.get(16).and_then(Value::as_f64),
                };
                let fields = TickerFields {
                    bid_price: number_at(arr, 2, "BID")?,
                    bid_size: number_at(arr, 4, "BID_SIZE")?,
                    ask_price: number_at(arr, 5, "ASK")?,
                    ask_size: number_at(arr, 7, "ASK_SIZE")?,
                    daily_change: number_at(arr, 8, "DAILY_CHANGE")?,
                    daily_change_relative: number_at(arr, 9, "DAILY_CHANGE_RELATIVE")?,
                    last_price: number_at(arr, 10, "LAST_PRICE")?,
                    volume: number_at(arr, 11, "VOLUME")?,
                    high: number_at(arr, 12, "HIGH")?,
                    low: number_at(arr, 13, "LOW")?,
                };
                Ok(Self::funding(symbol, funding, fields))
            }
        }
    }
}

/// Flat wire shape: one object per snapshot, funding-only fields `null` on
/// spot instruments.
impl Serialize for LiveSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut out = serializer.serialize_struct("LiveSnapshot", 17)?;
        out.serialize_field("symbol", self.symbol())?;
        out.serialize_field("pair_ticker", self.pair_ticker())?;
        out.serialize_field("kind", if self.is_funding_instrument() { "funding" } else { "spot" })?;
        out.serialize_field("bid_price", &fields.bid_price)?;
        out.serialize_field("bid_size", &fields.bid_size)?;
        out.serialize_field("ask_price", &fields.ask_price)?;
        out.serialize_field("ask_size", &fields.ask_size)?;
        out.serialize_field("daily_change", &fields.daily_change)?;
        out.serialize_field("daily_change_relative", &fields.daily_change_relative)?;
        out.serialize_field("last_price", &fields.last_price)?;
        out.serialize_field("volume", &fields.volume)?;
        out.serialize_field("high", &fields.high)?;
        out.serialize_field("low", &fields.low)?;
        out.serialize_field("flash_return_rate", &self.flash_return_rate())?;
        out.serialize_field("bid_period", &self.bid_period())?;
        out.serialize_field("ask_period", &self.ask_period())?;
        out.serialize_field("frr_amount", &self.frr_amount())?;
        out.end()
    }
}

fn number_at(arr: &[Value], idx: usize, name: &str) -> Result<f64> {
    arr.get(idx)
        .and_then(Value::as_f64)
        .with_context(|| format!("ticker field {name} (index {idx}) missing or not a number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_spot_ticker() {
        let raw = json!(["tBTCUSD", 10654, 53.62, 10655, 76.24, 7.47, 0.0007, 10655, 24949.23, 10880, 10444]);
        let snap = LiveSnapshot::from_wire(&raw).unwrap();

        assert_eq!(snap.symbol(), "TBTCUSD");
        assert_eq!(snap.pair_ticker(), "BTCUSD");
        assert!(!snap.is_funding_instrument());
        assert_eq!(snap.fields().bid_price, 10654.0);
        assert_eq!(snap.fields().low, 10444.0);
        assert_eq!(snap.flash_return_rate(), None);
        assert_eq!(snap.frr_amount(), None);
    }

    #[test]
    fn decodes_funding_ticker_with_optional_fields() {
        let raw = json!([
            "fUSD", 0.0003, 0.0002, 30, 1_000_000.0, 0.00021, 2, 500_000.0,
            0.00001, 0.05, 0.0002, 12_000_000.0, 0.0004, 0.0001, null, null, 250_000.0
        ]);
        let snap = LiveSnapshot::from_wire(&raw).unwrap();

        assert!(snap.is_funding_instrument());
        assert_eq!(snap.pair_ticker(), "USD");
        assert_eq!(snap.flash_return_rate(), Some(0.0003));
        assert_eq!(snap.bid_period(), Some(30));
        assert_eq!(snap.ask_period(), Some(2));
        assert_eq!(snap.frr_amount(), Some(250_000.0));
        assert_eq!(snap.fields().volume, 12_000_000.0);
    }

    #[test]
    fn funding_ticker_tolerates_missing_optional_fields() {
        let raw = json!(["fBTC", null, 0.0002, null, 10.0, 0.0003, null, 5.0, 0.0, 0.0, 0.0002, 100.0, 0.0004, 0.0001]);
        let snap = LiveSnapshot::from_wire(&raw).unwrap();
        assert_eq!(snap.flash_return_rate(), None);
        assert_eq!(snap.bid_period(), None);
        assert_eq!(snap.frr_amount(), None);
    }

    #[test]
    fn unknown_marker_fails_explicitly() {
        let raw = json!(["xBTCUSD", 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]);
        let err = LiveSnapshot::from_wire(&raw).unwrap_err();
        assert!(err.to_string().contains("unknown instrument marker"));
    }

    #[test]
    fn truncated_spot_ticker_fails() {
        let raw = json!(["tBTCUSD", 1, 2, 3]);
        assert!(LiveSnapshot::from_wire(&raw).is_err());
    }

    #[test]
    fn serializes_flat_with_null_funding_fields_on_spot() {
        let raw = json!(["tBTCUSD", 10654, 53.62, 10655, 76.24, 7.47, 0.0007, 10655, 24949.23, 10880, 10444]);
        let value = serde_json::to_value(LiveSnapshot::from_wire(&raw).unwrap()).unwrap();

        assert_eq!(value["symbol"], "TBTCUSD");
        assert_eq!(value["pair_ticker"], "BTCUSD");
        assert_eq!(value["kind"], "spot");
        assert_eq!(value["last_price"], 10655.0);
        assert!(value["flash_return_rate"].is_null());
        assert!(value["frr_amount"].is_null());
    }

    #[test]
    fn serializes_funding_fields() {
        let raw = json!([
            "fUSD", 0.0003, 0.0002, 30, 1_000_000.0, 0.00021, 2, 500_000.0,
            0.00001, 0.05, 0.0002, 12_000_000.0, 0.0004, 0.0001, null, null, 250_000.0
        ]);
        let value = serde_json::to_value(LiveSnapshot::from_wire(&raw).unwrap()).unwrap();

        assert_eq!(value["kind"], "funding");
        assert_eq!(value["bid_period"], 30);
        assert_eq!(value["frr_amount"], 250_000.0);
    }

    #[test]
    fn constructor_uppercases_symbol() {
        let snap = LiveSnapshot::spot("tBtcUsD", TickerFields::default());
        assert_eq!(snap.symbol(), "TBTCUSD");
        assert_eq!(snap.pair_ticker(), "BTCUSD");
    }
}
