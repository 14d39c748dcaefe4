// =============================================================================
// Runtime Configuration — market board settings with atomic save
// =============================================================================
//
// Everything tunable about the board lives here: which exchange endpoint to
// talk to, which quote currency the deployment is pinned to, how often live
// tickers are polled and where the API listens.
//
// All fields carry `#[serde(default)]` so that an older or partial config
// file always loads.  Persistence uses the tmp + rename pattern.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::market_data::SymbolInfo;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_api_base_url() -> String {
    "https://api-pub.bitfinex.com/v2".to_string()
}

fn default_quote_code() -> String {
    "USD".to_string()
}

fn default_quote_display_symbol() -> String {
    "USD".to_string()
}

fn default_quote_display_name() -> String {
    "US Dollar".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

// =============================================================================
// QuoteCurrency
// =============================================================================

/// The single quote currency this deployment lists pairs against.
///
/// Display values are fixed here rather than looked up from the exchange's
/// symbol and label tables.  A display value left out of the config falls
/// back to the code itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteCurrency {
    /// Exchange code the pair list is filtered on (e.g. `USD`).
    #[serde(default = "default_quote_code")]
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Default for QuoteCurrency {
    fn default() -> Self {
        Self {
            code: default_quote_code(),
            display_symbol: Some(default_quote_display_symbol()),
            display_name: Some(default_quote_display_name()),
        }
    }
}

impl QuoteCurrency {
    /// A quote with no display values of its own.
    pub fn from_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_symbol: None,
            display_name: None,
        }
    }

    /// Uppercased exchange code used when filtering pairs.
    pub fn normalized_code(&self) -> String {
        self.code.trim().to_uppercase()
    }

    /// The quote side of every pair descriptor.
    pub fn symbol_info(&self) -> SymbolInfo {
        let code = self.normalized_code();
        SymbolInfo::new(
            &code,
            self.display_symbol.as_deref().unwrap_or(&code),
            self.display_name.as_deref().unwrap_or(&code),
        )
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the market board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Base URL of the public Bitfinex v2 REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Quote currency every listed pair is filtered to.
    #[serde(default)]
    pub quote: QuoteCurrency,

    /// Seconds between live ticker polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Address the HTTP / WebSocket API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            quote: QuoteCurrency::default(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            quote = %config.quote.code,
            poll_interval_secs = config.poll_interval_secs,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `MARKET_BOARD_*` overrides. `lookup` is `std::env::var` in
    /// production.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("MARKET_BOARD_BIND_ADDR") {
            let addr = addr.trim();
            if !addr.is_empty() {
                self.bind_addr = addr.to_string();
            }
        }

        if let Some(code) = lookup("MARKET_BOARD_QUOTE") {
            let code = code.trim().to_uppercase();
            if !code.is_empty() && code != self.quote.normalized_code() {
                // Display values belong to the old currency.
                self.quote = QuoteCurrency::from_code(code);
            }
        }

        if let Some(secs) = lookup("MARKET_BOARD_POLL_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.poll_interval_secs = secs,
                _ => warn!(value = %secs, "ignoring invalid MARKET_BOARD_POLL_SECS"),
            }
        }
    }

    /// Poll period, never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.api_base_url, "https://api-pub.bitfinex.com/v2");
        assert_eq!(cfg.quote.code, "USD");
        assert_eq!(cfg.quote.display_name.as_deref(), Some("US Dollar"));
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.quote, QuoteCurrency::default());
        assert_eq!(cfg.poll_interval_secs, 5);
    }

    #[test]
    fn partial_quote_displays_its_own_code() {
        let json = r#"{ "quote": { "code": "eur" }, "poll_interval_secs": 0 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.quote.normalized_code(), "EUR");
        assert_eq!(cfg.quote.symbol_info(), SymbolInfo::new("EUR", "EUR", "EUR"));
        // A zero interval would panic tokio's interval timer.
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn quote_symbol_info_is_uppercased() {
        let info = QuoteCurrency::default().symbol_info();
        assert_eq!(info.api_symbol, "USD");
        assert_eq!(info.display_symbol, "USD");
        assert_eq!(info.display_name, "US DOLLAR");
    }

    #[test]
    fn missing_display_name_falls_back_per_field() {
        let json = r#"{ "quote": { "code": "GBP", "display_symbol": "£" } }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.quote.symbol_info(), SymbolInfo::new("GBP", "£", "GBP"));
    }

    #[test]
    fn overrides_apply_valid_values_only() {
        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|key| match key {
            "MARKET_BOARD_BIND_ADDR" => Some("127.0.0.1:9000".to_string()),
            "MARKET_BOARD_QUOTE" => Some(" eur ".to_string()),
            "MARKET_BOARD_POLL_SECS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.quote.code, "EUR");
        assert_eq!(cfg.quote.symbol_info(), SymbolInfo::new("EUR", "EUR", "EUR"));
        assert_eq!(cfg.poll_interval_secs, 5);
    }

    #[test]
    fn same_quote_override_keeps_display_values() {
        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|key| (key == "MARKET_BOARD_QUOTE").then(|| "usd".to_string()));
        assert_eq!(cfg.quote, QuoteCurrency::default());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("market-board-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("market_config.json");

        let mut cfg = RuntimeConfig::default();
        cfg.poll_interval_secs = 12;
        cfg.save(&path).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.poll_interval_secs, 12);
        assert_eq!(loaded.quote, cfg.quote);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
