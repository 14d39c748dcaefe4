use serde::Serialize;

use super::{LiveSnapshot, PairDescriptor};
use crate::types::FreshnessStatus;

/// One row of the published board: a live snapshot joined with its pair
/// descriptor and stamped with the pipeline-wide freshness at recompute time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketItem {
    pub snapshot: LiveSnapshot,
    pub descriptor: PairDescriptor,
    pub status: FreshnessStatus,
}

/// Everything one recompute produced: the rows plus the query and status they
/// were computed with.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Board {
    pub status: FreshnessStatus,
    pub query: String,
    pub items: Vec<MarketItem>,
}
