//! Registry of page paths already scheduled during one crawl

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Result of trying to schedule a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The path was new and is now recorded
    Admitted,
    /// The path had already been recorded
    AlreadyVisited,
    /// The page budget is spent
    LimitReached,
}

/// Thread-safe set of visited page paths
///
/// One instance lives for exactly one crawl and is shared with the workers
/// through an `Arc`. The set only grows. Every method holds the lock for
/// the duration of a single set operation and never across an `.await`.
#[derive(Debug, Default)]
pub struct VisitedSet {
    paths: Mutex<HashSet<String>>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    fn paths(&self) -> MutexGuard<'_, HashSet<String>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true if `path` has been recorded
    pub fn has(&self, path: &str) -> bool {
        self.paths().contains(path)
    }

    /// Records `path`; recording the same path twice is a no-op
    pub fn add(&self, path: &str) {
        self.paths().insert(path.to_string());
    }

    /// Number of distinct recorded paths
    pub fn count(&self) -> usize {
        self.paths().len()
    }

    /// Checks the budget and records `path` in one critical section
    ///
    /// `limit == 0` means unbounded. With a positive limit the set never
    /// grows past `limit` entries, and two concurrent callers offering the
    /// same unseen path get exactly one `Admitted`.
    pub fn try_admit(&self, path: &str, limit: usize) -> Admission {
        let mut paths = self.paths();

        if paths.contains(path) {
            return Admission::AlreadyVisited;
        }

        if limit > 0 && paths.len() >= limit {
            return Admission::LimitReached;
        }

        paths.insert(path.to_string());
        Admission::Admitted
    }
}
