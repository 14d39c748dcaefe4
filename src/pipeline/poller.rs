// =============================================================================
// Live Ticker Poller
// =============================================================================
//
// One timer per pipeline, created the first time the reference set is
// non-empty.  The first tick fires immediately; after that every
// `poll_interval`.  Each tick issues one batched ticker request for every
// known pair.  A failed poll is simply retried on the next tick.
// =============================================================================

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::{Pipeline, Shared};
use crate::market_data::{PairDescriptor, SPOT_MARKER};

/// Spot-instrument request symbols for every known pair, e.g. `tBTCUSD`.
pub fn request_symbols(reference: &[PairDescriptor]) -> Vec<String> {
    reference
        .iter()
        .map(|descriptor| format!("{SPOT_MARKER}{}", descriptor.pair_ticker))
        .collect()
}

/// Spawn the polling loop. The task holds only a weak handle so dropping the
/// last `Pipeline` ends it.
pub(super) fn spawn(shared: Weak<Shared>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_ms = period.as_millis() as u64, "live ticker poller started");

        loop {
            ticker.tick().await;

            let Some(shared) = shared.upgrade() else {
                break;
            };
            let pipeline = Pipeline { shared };
            if pipeline.is_closed() {
                break;
            }
            pipeline.poll_once().await;
        }

        debug!("live ticker poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::SymbolInfo;

    #[test]
    fn request_symbols_prefix_spot_marker() {
        let usd = SymbolInfo::new("USD", "USD", "US Dollar");
        let reference = vec![
            PairDescriptor::new("BTCUSD", SymbolInfo::new("BTC", "BTC", "Bitcoin"), usd.clone()),
            PairDescriptor::new("DUSK:USD", SymbolInfo::new("DUSK", "DUSK", "Dusk"), usd),
        ];
        assert_eq!(request_symbols(&reference), vec!["tBTCUSD", "tDUSK:USD"]);
    }

    #[test]
    fn no_pairs_no_symbols() {
        assert!(request_symbols(&[]).is_empty());
    }
}
