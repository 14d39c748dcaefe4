// =============================================================================
// Join & Filter Engine
// =============================================================================
//
// Pure function of (reference set, snapshot set, query, status).  Output order
// follows the snapshot set, so the board tracks the latest poll's order.
// Snapshots without a matching pair are dropped, as are pairs that fail the
// query; neither is an error.
// =============================================================================

use std::collections::HashMap;

use crate::market_data::{LiveSnapshot, MarketItem, PairDescriptor};
use crate::types::FreshnessStatus;

/// Trim and uppercase a raw query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_uppercase()
}

/// `normalized` must already be trimmed and uppercased. Empty matches all.
pub fn matches_query(descriptor: &PairDescriptor, normalized: &str) -> bool {
    normalized.is_empty()
        || descriptor
            .searchable_fields()
            .iter()
            .any(|field| field.contains(normalized))
}

/// Rebuild the published board from the latest value of every input.
pub fn recompute(
    reference: &[PairDescriptor],
    snapshots: &[LiveSnapshot],
    query: &str,
    status: FreshnessStatus,
) -> Vec<MarketItem> {
    let query = normalize_query(query);

    // First descriptor wins on duplicate tickers.
    let mut by_ticker: HashMap<&str, &PairDescriptor> = HashMap::with_capacity(reference.len());
    for descriptor in reference {
        by_ticker
            .entry(descriptor.pair_ticker.as_str())
            .or_insert(descriptor);
    }

    snapshots
        .iter()
        .filter_map(|snapshot| {
            let descriptor = by_ticker.get(snapshot.pair_ticker())?;
            matches_query(descriptor, &query).then(|| MarketItem {
                snapshot: snapshot.clone(),
                descriptor: (*descriptor).clone(),
                status,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::SymbolInfo;
    use crate::market_service::testing::spot_ticker;

    fn usd() -> SymbolInfo {
        SymbolInfo::new("USD", "USD", "US Dollar")
    }

    fn descriptor(ticker: &str, base: &str, name: &str) -> PairDescriptor {
        PairDescriptor::new(ticker, SymbolInfo::new(base, base, name), usd())
    }

    fn reference() -> Vec<PairDescriptor> {
        vec![
            descriptor("BTCUSD", "BTC", "Bitcoin"),
            descriptor("LTCUSD", "LTC", "Litcoin"),
            descriptor("ETHUSD", "ETH", "Ethereum"),
        ]
    }

    fn snapshots() -> Vec<LiveSnapshot> {
        vec![
            spot_ticker("tBtcUsD", 1.1),
            spot_ticker("tetHuSD", 1.1),
            spot_ticker("tlTcUSd", 1.1),
        ]
    }

    fn tickers(items: &[MarketItem]) -> Vec<&str> {
        items.iter().map(|i| i.descriptor.pair_ticker.as_str()).collect()
    }

    #[test]
    fn single_pair_joins_with_status() {
        let items = recompute(
            &[descriptor("BTCUSD", "BTC", "Bitcoin")],
            &[spot_ticker("tBTCUSD", 1.1)],
            "",
            FreshnessStatus::UpToDate,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].descriptor, descriptor("BTCUSD", "BTC", "BITCOIN"));
        assert_eq!(items[0].status, FreshnessStatus::UpToDate);
    }

    #[test]
    fn output_follows_snapshot_order() {
        let items = recompute(&reference(), &snapshots(), "", FreshnessStatus::UpToDate);
        assert_eq!(tickers(&items), vec!["BTCUSD", "ETHUSD", "LTCUSD"]);
    }

    #[test]
    fn empty_and_blank_queries_match_everything() {
        for query in ["", "   ", "\n\t"] {
            let items = recompute(&reference(), &snapshots(), query, FreshnessStatus::UpToDate);
            assert_eq!(items.len(), 3, "query {query:?}");
        }
    }

    #[test]
    fn query_without_match_yields_empty() {
        let items = recompute(&reference(), &snapshots(), "ChSb", FreshnessStatus::UpToDate);
        assert!(items.is_empty());
    }

    #[test]
    fn query_on_partial_name_is_case_insensitive() {
        let items = recompute(&reference(), &snapshots(), "iTc", FreshnessStatus::UpToDate);
        assert_eq!(tickers(&items), vec!["BTCUSD", "LTCUSD"]);
    }

    #[test]
    fn query_on_symbol_and_ticker() {
        let items = recompute(&reference(), &snapshots(), " bTc ", FreshnessStatus::UpToDate);
        assert_eq!(tickers(&items), vec!["BTCUSD"]);

        let items = recompute(&reference(), &snapshots(), "btcusd", FreshnessStatus::UpToDate);
        assert_eq!(tickers(&items), vec!["BTCUSD"]);

        let items = recompute(&reference(), &snapshots(), "tcusd", FreshnessStatus::UpToDate);
        assert_eq!(tickers(&items), vec!["BTCUSD", "LTCUSD"]);
    }

    #[test]
    fn query_matches_quote_side() {
        let items = recompute(&reference(), &snapshots(), "dollar", FreshnessStatus::UpToDate);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn unmatched_snapshots_never_appear() {
        let mut snaps = snapshots();
        snaps.push(spot_ticker("tXRPUSD", 0.5));
        snaps.push(spot_ticker("fUSD", 0.0002));

        for query in ["", "XRP", "USD", "TXRPUSD"] {
            let items = recompute(&reference(), &snaps, query, FreshnessStatus::UpToDate);
            assert!(
                items.iter().all(|i| i.snapshot.pair_ticker() != "XRPUSD"),
                "query {query:?}"
            );
            assert!(items.iter().all(|i| !i.snapshot.symbol().starts_with('F')));
        }
    }

    #[test]
    fn retained_iff_query_is_substring_of_a_field() {
        let reference = reference();
        let snaps = snapshots();
        for query in ["B", "COIN", "ETH", "USD", "US D", "LTCU", "ERE", "Z", "BTCUSDX"] {
            let items = recompute(&reference, &snaps, query, FreshnessStatus::Outdated);
            let expected: Vec<&str> = ["BTCUSD", "ETHUSD", "LTCUSD"]
                .into_iter()
                .filter(|t| {
                    let d = reference.iter().find(|d| d.pair_ticker == *t).unwrap();
                    d.searchable_fields().iter().any(|f| f.contains(query))
                })
                .collect();
            assert_eq!(tickers(&items), expected, "query {query:?}");
        }
    }

    #[test]
    fn no_reference_means_no_items() {
        for query in ["", "BTC"] {
            assert!(recompute(&[], &snapshots(), query, FreshnessStatus::UpToDate).is_empty());
        }
    }

    #[test]
    fn recompute_is_idempotent() {
        let a = recompute(&reference(), &snapshots(), "itc", FreshnessStatus::Outdated);
        let b = recompute(&reference(), &snapshots(), "itc", FreshnessStatus::Outdated);
        assert_eq!(a, b);
    }

    #[test]
    fn every_item_carries_the_passed_status() {
        let items = recompute(&reference(), &snapshots(), "", FreshnessStatus::Outdated);
        assert!(items.iter().all(|i| i.status == FreshnessStatus::Outdated));
    }
}
