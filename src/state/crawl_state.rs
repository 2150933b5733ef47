/// Crawl state definitions for tracking crawl progress
///
/// A crawl moves `Idle → Crawling` and ends in exactly one terminal state.
use std::fmt;

/// Represents the current state of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Coordinator built, nothing enqueued yet
    Idle,

    /// Root URL enqueued, workers running
    Crawling,

    // ===== Terminal States =====
    /// Pool drained and the aggregator closed
    Completed,

    /// External cancellation fired before completion
    Cancelled,

    /// A crawl-wide error stopped the crawl
    Failed,
}

impl CrawlState {
    /// Returns true if this is a terminal state (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Crawling)
                | (Self::Idle, Self::Failed)
                | (Self::Crawling, Self::Completed)
                | (Self::Crawling, Self::Cancelled)
                | (Self::Crawling, Self::Failed)
        )
    }

    /// Short lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Crawling => "crawling",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a crawl that ran to the end of its worker pool finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlOutcome {
    /// Every reachable, admitted page was handled
    Completed,

    /// Stopped by cancellation; usage counts are partial
    Cancelled,
}

impl CrawlOutcome {
    /// Returns true if the usage table covers the whole crawl
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The terminal crawl state matching this outcome
    pub fn state(&self) -> CrawlState {
        match self {
            Self::Completed => CrawlState::Completed,
            Self::Cancelled => CrawlState::Cancelled,
        }
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state())
    }
}
