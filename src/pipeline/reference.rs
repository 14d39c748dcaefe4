// =============================================================================
// Reference Data Loader
// =============================================================================
//
// Pairs, currency symbols and currency labels are fetched concurrently and
// joined into pair descriptors for the configured quote currency.  The three
// fetches succeed or fail as a unit; there is no partial join.
// =============================================================================

use tracing::debug;

use super::SyncError;
use crate::market_data::{CurrencyEntry, PairDescriptor, SymbolInfo, TradingPair};
use crate::market_service::MarketDataService;
use crate::runtime_config::QuoteCurrency;

/// Fetch and join the reference set.
pub async fn load(
    service: &dyn MarketDataService,
    quote: &QuoteCurrency,
) -> Result<Vec<PairDescriptor>, SyncError> {
    let (pairs, symbols, labels) = tokio::try_join!(
        service.fetch_pairs(),
        service.fetch_symbols(),
        service.fetch_labels(),
    )
    .map_err(SyncError::ReferenceLoad)?;

    Ok(join_reference(&pairs, &symbols, &labels, quote))
}

/// Keep pairs quoted in `quote` whose base has both a symbol entry (by code
/// or display code) and a label entry (by code). Source order is preserved.
pub fn join_reference(
    pairs: &[TradingPair],
    symbols: &[CurrencyEntry],
    labels: &[CurrencyEntry],
    quote: &QuoteCurrency,
) -> Vec<PairDescriptor> {
    let quote_code = quote.normalized_code();
    let quote_info = quote.symbol_info();

    let descriptors: Vec<PairDescriptor> = pairs
        .iter()
        .filter(|pair| pair.quote() == quote_code)
        .filter_map(|pair| {
            let base = pair.base();
            let symbol = symbols
                .iter()
                .find(|s| s.code == base || s.value == base)?;
            let label = labels.iter().find(|l| l.code == base)?;

            Some(PairDescriptor::new(
                pair.ticker(),
                SymbolInfo::new(&symbol.code, &symbol.value, &label.value),
                quote_info.clone(),
            ))
        })
        .collect();

    debug!(
        source_pairs = pairs.len(),
        joined = descriptors.len(),
        quote = %quote_code,
        "reference set joined"
    );

    descriptors
}
