pub mod item;
pub mod symbol;
pub mod ticker;

pub use item::{Board, MarketItem};
pub use symbol::{CurrencyEntry, PairDescriptor, SymbolInfo, TradingPair};
pub use ticker::{LiveSnapshot, SPOT_MARKER};
