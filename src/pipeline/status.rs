// =============================================================================
// Freshness state machine
// =============================================================================
//
//   None ──► UpToDate ◄──► Outdated
//     └────────────────────►┘
//
// Only a live poll can make the board up to date.  A successful reference
// load leaves the status untouched; any failed fetch marks it outdated.
// `None` is never re-entered.
// =============================================================================

use crate::types::FreshnessStatus;

/// Fetch outcomes that drive [`FreshnessStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchEvent {
    ReferenceLoaded,
    ReferenceFailed,
    PollSucceeded,
    PollFailed,
}

impl FreshnessStatus {
    pub fn transition(self, event: FetchEvent) -> Self {
        match event {
            FetchEvent::ReferenceLoaded => self,
            FetchEvent::PollSucceeded => Self::UpToDate,
            FetchEvent::ReferenceFailed | FetchEvent::PollFailed => Self::Outdated,
        }
    }
}
