// =============================================================================
// API surface — REST + WebSocket over the published board
// =============================================================================

pub mod rest;
pub mod ws;

use std::sync::Arc;

use serde::Serialize;

use crate::market_data::{Board, MarketItem};
use crate::market_service::PlatformStatusSource;
use crate::pipeline::{Pipeline, QuerySink};
use crate::types::FreshnessStatus;

pub use rest::router;

/// Shared handler state.
pub struct ApiState {
    pub pipeline: Pipeline,
    pub query_sink: QuerySink,
    pub platform: Arc<dyn PlatformStatusSource>,
}

impl ApiState {
    pub fn new(pipeline: Pipeline, platform: Arc<dyn PlatformStatusSource>) -> Self {
        let query_sink = pipeline.query_sink();
        Self {
            pipeline,
            query_sink,
            platform,
        }
    }

    /// The board as currently published.
    pub fn board(&self) -> BoardView {
        BoardView::from(self.pipeline.board())
    }
}

/// Wire shape of the board, shared by `GET /markets` and WebSocket pushes.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub status: FreshnessStatus,
    pub query: String,
    pub count: usize,
    pub items: Vec<MarketItem>,
}

impl From<Board> for BoardView {
    fn from(board: Board) -> Self {
        Self {
            status: board.status,
            query: board.query,
            count: board.items.len(),
            items: board.items,
        }
    }
}
