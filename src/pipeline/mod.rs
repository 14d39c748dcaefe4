// =============================================================================
// Market-Data Synchronization Pipeline
// =============================================================================
//
// Three producers feed one recompute step:
//
//   1. Reference load (one-shot): pairs + symbols + labels, joined.
//   2. Live poll (periodic): batched tickers for every known pair.
//   3. Query input (external): any rate.
//
// The latest value of each input plus the freshness status live in a single
// mutex-guarded `SyncState`.  Every change recomputes the board under that
// lock and publishes it, together with the query and status it used, on a
// `watch` channel.  Recomputes never interleave and publications are ordered
// like recomputes.  Fetches run outside the
// lock.
//
// Teardown marks the state closed and aborts the spawned tasks.  A fetch that
// lands after teardown is discarded.
// =============================================================================

pub mod error;
pub mod filter;
pub mod poller;
pub mod reference;
pub mod status;

pub use error::SyncError;
pub use status::FetchEvent;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::market_data::{Board, LiveSnapshot, MarketItem, PairDescriptor};
use crate::market_service::MarketDataService;
use crate::runtime_config::{QuoteCurrency, RuntimeConfig};
use crate::types::FreshnessStatus;

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub quote: QuoteCurrency,
    pub poll_interval: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            quote: config.quote.clone(),
            poll_interval: config.poll_interval(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&RuntimeConfig::default())
    }
}

// =============================================================================
// Shared state
// =============================================================================

/// The only shared mutable tuple. Written by the pipeline, read by recompute.
#[derive(Default)]
struct SyncState {
    reference: Vec<PairDescriptor>,
    snapshots: Vec<LiveSnapshot>,
    query: String,
    status: FreshnessStatus,
    closed: bool,
}

struct Shared {
    service: Arc<dyn MarketDataService>,
    settings: PipelineSettings,
    state: Mutex<SyncState>,
    board_tx: watch::Sender<Board>,
    query_tx: watch::Sender<String>,
    started: AtomicBool,
    poller_started: AtomicBool,
    // Lock order: `tasks` before `state`.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Handle to one synchronization pipeline. Cheap to clone; all clones share
/// the same state.
#[derive(Clone)]
pub struct Pipeline {
    shared: Arc<Shared>,
}

impl Pipeline {
    pub fn new(service: Arc<dyn MarketDataService>, settings: PipelineSettings) -> Self {
        let (board_tx, _) = watch::channel(Board::default());
        let (query_tx, _) = watch::channel(String::new());

        Self {
            shared: Arc::new(Shared {
                service,
                settings,
                state: Mutex::new(SyncState::default()),
                board_tx,
                query_tx,
                started: AtomicBool::new(false),
                poller_started: AtomicBool::new(false),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Spawn the reference load (which starts the poller once pairs are
    /// known) and the query task. Must be called inside a tokio runtime.
    /// Calling it again is a no-op.
    pub fn start(&self) {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            warn!("pipeline already started");
            return;
        }

        let mut tasks = self.shared.tasks.lock();
        if self.is_closed() {
            return;
        }

        let weak = Arc::downgrade(&self.shared);
        tasks.push(tokio::spawn(async move {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let pipeline = Pipeline { shared };
            pipeline.load_reference().await;
            pipeline.ensure_poller();
        }));

        let mut query_rx = self.shared.query_tx.subscribe();
        let weak = Arc::downgrade(&self.shared);
        tasks.push(tokio::spawn(async move {
            // `changed` fails once the sender (owned by `Shared`) is gone.
            while query_rx.changed().await.is_ok() {
                let query = query_rx.borrow_and_update().clone();
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                Pipeline { shared }.set_query(query);
            }
        }));

        info!(quote = %self.shared.settings.quote.code, "pipeline started");
    }

    /// Stop polling and discard any fetch result that lands afterwards.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }

        for task in self.shared.tasks.lock().drain(..) {
            task.abort();
        }
        info!("pipeline shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    // ── Producers ───────────────────────────────────────────────────────

    /// Fetch and apply the reference set. On failure the previous set is
    /// kept and the board is marked outdated.
    pub async fn load_reference(&self) {
        if self.is_closed() {
            return;
        }
        let result = reference::load(self.shared.service.as_ref(), &self.shared.settings.quote).await;
        self.apply_reference(result);
    }

    /// Start the poll timer if the reference set is non-empty and no timer
    /// exists yet. Returns whether a timer was created by this call.
    pub fn ensure_poller(&self) -> bool {
        let mut tasks = self.shared.tasks.lock();
        {
            let state = self.shared.state.lock();
            if state.closed || state.reference.is_empty() {
                return false;
            }
        }

        if self
            .shared
            .poller_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        tasks.push(poller::spawn(
            Arc::downgrade(&self.shared),
            self.shared.settings.poll_interval,
        ));
        true
    }

    /// One batched live fetch for every known pair.
    pub async fn poll_once(&self) {
        let symbols = {
            let state = self.shared.state.lock();
            if state.closed {
                return;
            }
            poller::request_symbols(&state.reference)
        };

        if symbols.is_empty() {
            debug!("no known pairs, skipping live poll");
            return;
        }

        let result = self
            .shared
            .service
            .fetch_tickers(&symbols)
            .await
            .map_err(SyncError::LiveFetch);
        self.apply_live(result);
    }

    /// Replace the current query and recompute immediately.
    pub fn set_query(&self, query: impl Into<String>) {
        let mut state = self.shared.state.lock();
        if state.closed {
            return;
        }
        state.query = query.into();
        self.publish(&state);
    }

    /// Coalescing query input for callers that may submit at any rate. Only
    /// the latest submission is applied; requires [`Pipeline::start`].
    pub fn query_sink(&self) -> QuerySink {
        QuerySink {
            shared: Arc::clone(&self.shared),
        }
    }

    // ── Published output ────────────────────────────────────────────────

    /// Receiver for the full board, replaced on every recompute.
    pub fn subscribe(&self) -> watch::Receiver<Board> {
        self.shared.board_tx.subscribe()
    }

    /// The last published board.
    pub fn board(&self) -> Board {
        self.shared.board_tx.borrow().clone()
    }

    pub fn items(&self) -> Vec<MarketItem> {
        self.shared.board_tx.borrow().items.clone()
    }

    pub fn status(&self) -> FreshnessStatus {
        self.shared.state.lock().status
    }

    pub fn query(&self) -> String {
        self.shared.state.lock().query.clone()
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn apply_reference(&self, result: Result<Vec<PairDescriptor>, SyncError>) {
        let mut state = self.shared.state.lock();
        if state.closed {
            debug!("reference result arrived after shutdown, ignored");
            return;
        }

        match result {
            Ok(reference) => {
                info!(pairs = reference.len(), "reference data loaded");
                state.reference = reference;
                state.status = state.status.transition(FetchEvent::ReferenceLoaded);
            }
            Err(err) => {
                warn!(error = %err, pairs = state.reference.len(), "keeping previous reference set");
                state.status = state.status.transition(FetchEvent::ReferenceFailed);
            }
        }

        self.publish(&state);
    }

    fn apply_live(&self, result: Result<Vec<LiveSnapshot>, SyncError>) {
        let mut state = self.shared.state.lock();
        if state.closed {
            debug!("ticker result arrived after shutdown, ignored");
            return;
        }

        match result {
            Ok(snapshots) => {
                debug!(tickers = snapshots.len(), "live tickers updated");
                state.snapshots = snapshots;
                state.status = state.status.transition(FetchEvent::PollSucceeded);
            }
            Err(err) => {
                warn!(error = %err, stale = state.snapshots.len(), "keeping stale tickers");
                state.status = state.status.transition(FetchEvent::PollFailed);
            }
        }

        self.publish(&state);
    }

    /// Recompute from `state` and publish. Callers hold the state lock.
    fn publish(&self, state: &SyncState) {
        let items = filter::recompute(&state.reference, &state.snapshots, &state.query, state.status);
        debug!(items = items.len(), status = %state.status, "board recomputed");
        self.shared.board_tx.send_replace(Board {
            status: state.status,
            query: state.query.clone(),
            items,
        });
    }
}

/// Write end of the query input. See [`Pipeline::query_sink`].
#[derive(Clone)]
pub struct QuerySink {
    shared: Arc<Shared>,
}

impl QuerySink {
    pub fn submit(&self, query: impl Into<String>) {
        self.shared.query_tx.send_replace(query.into());
    }
}
