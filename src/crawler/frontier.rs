//! Frontier queue of pages waiting to be rendered
//!
//! The frontier is a bounded channel plus a count of outstanding pages.
//! A page is outstanding from the moment it is admitted until a worker has
//! finished with it, children included. When the count drops to zero the
//! crawl is drained and idle workers stop right away instead of waiting out
//! their idle timeout.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a worker got when it asked for more work
#[derive(Debug, PartialEq, Eq)]
pub enum Next {
    /// A page to process
    Page(Url),
    /// No work arrived within the idle timeout
    Idle,
    /// Every admitted page has been handled
    Drained,
    /// The crawl was cancelled
    Cancelled,
}

/// Bounded queue of admitted page URLs
#[derive(Debug)]
pub struct Frontier {
    sender: mpsc::Sender<Url>,
    receiver: Mutex<mpsc::Receiver<Url>>,
    outstanding: AtomicUsize,
    drained: CancellationToken,
}

impl Frontier {
    /// Creates a frontier holding at most `capacity` queued URLs
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
            outstanding: AtomicUsize::new(0),
            drained: CancellationToken::new(),
        }
    }

    /// Records that one more page has been admitted and will be enqueued
    pub fn admitted(&self) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Records that an admitted page has been fully handled
    pub fn completed(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            tracing::debug!("Frontier drained");
            self.drained.cancel();
        }
    }

    /// Number of admitted pages not yet fully handled
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Returns true once every admitted page has been handled
    pub fn is_drained(&self) -> bool {
        self.drained.is_cancelled()
    }

    /// Sends an admitted URL, giving up if `cancel` fires first
    ///
    /// Returns false if the URL was not enqueued.
    pub async fn enqueue(&self, url: Url, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            sent = self.sender.send(url) => sent.is_ok(),
        }
    }

    /// Enqueues admitted URLs from a background task
    ///
    /// The caller continues immediately. URLs that could not be sent because
    /// the crawl was cancelled are marked completed so the outstanding count
    /// stays consistent.
    pub fn spawn_enqueue(self: &Arc<Self>, urls: Vec<Url>, cancel: CancellationToken) {
        if urls.is_empty() {
            return;
        }

        let frontier = Arc::clone(self);
        tokio::spawn(async move {
            let mut urls = urls.into_iter();
            while let Some(url) = urls.next() {
                if !frontier.enqueue(url, &cancel).await {
                    frontier.completed();
                    for _ in urls.by_ref() {
                        frontier.completed();
                    }
                    break;
                }
            }
        });
    }

    /// Waits for the next URL, the idle timeout, drain, or cancellation
    pub async fn next(&self, idle_timeout: Duration, cancel: &CancellationToken) -> Next {
        let receive = async {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Next::Cancelled,
            _ = self.drained.cancelled() => Next::Drained,
            received = tokio::time::timeout(idle_timeout, receive) => match received {
                Ok(Some(url)) => Next::Page(url),
                Ok(None) => Next::Drained,
                Err(_) => Next::Idle,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://example.com/").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_fifo_delivery() {
        let frontier = Frontier::new(8);
        let cancel = CancellationToken::new();

        for path in ["/a", "/b", "/c"] {
            frontier.admitted();
            assert!(frontier.enqueue(url(path), &cancel).await);
        }

        for path in ["/a", "/b", "/c"] {
            assert_eq!(
                frontier.next(Duration::from_secs(1), &cancel).await,
                Next::Page(url(path))
            );
        }
    }

    #[tokio::test]
    async fn test_idle_timeout() {
        let frontier = Frontier::new(8);
        frontier.admitted();
        let cancel = CancellationToken::new();

        assert_eq!(
            frontier.next(Duration::from_millis(20), &cancel).await,
            Next::Idle
        );
    }

    #[tokio::test]
    async fn test_drained_when_outstanding_reaches_zero() {
        let frontier = Frontier::new(8);
        let cancel = CancellationToken::new();

        frontier.admitted();
        frontier.admitted();
        frontier.completed();
        assert!(!frontier.is_drained());
        frontier.completed();
        assert!(frontier.is_drained());

        assert_eq!(
            frontier.next(Duration::from_secs(5), &cancel).await,
            Next::Drained
        );
    }

    #[tokio::test]
    async fn test_cancel_wins() {
        let frontier = Frontier::new(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        frontier.admitted();
        frontier.enqueue(url("/a"), &CancellationToken::new()).await;

        assert_eq!(
            frontier.next(Duration::from_secs(5), &cancel).await,
            Next::Cancelled
        );
    }

    #[tokio::test]
    async fn test_blocked_enqueue_aborts_on_cancel() {
        let frontier = Arc::new(Frontier::new(1));
        let cancel = CancellationToken::new();

        frontier.admitted();
        assert!(frontier.enqueue(url("/full"), &cancel).await);

        let blocked = {
            let frontier = frontier.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { frontier.enqueue(url("/blocked"), &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let sent = tokio::time::timeout(Duration::from_secs(1), blocked)
            .await
            .expect("blocked send must return after cancellation")
            .unwrap();
        assert!(!sent);
    }

    #[tokio::test]
    async fn test_spawn_enqueue_releases_counts_on_cancel() {
        let frontier = Arc::new(Frontier::new(1));
        let cancel = CancellationToken::new();

        for _ in 0..3 {
            frontier.admitted();
        }
        frontier.spawn_enqueue(vec![url("/a"), url("/b"), url("/c")], cancel.clone());

        // Only one fits; the fan-out task is now blocked on the second send.
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(frontier.outstanding(), 1);
    }
}
