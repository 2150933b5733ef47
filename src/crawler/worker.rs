//! Crawl worker loop
//!
//! A worker pulls a URL from the frontier, renders it, counts the classes on
//! every class-bearing element, admits the same-host links it finds, and
//! publishes the page's class counts to the aggregator. Errors scoped to a
//! page or an element are logged and never end the worker.

use crate::crawler::aggregator::ClassObservation;
use crate::crawler::frontier::{Frontier, Next};
use crate::crawler::visited::{Admission, VisitedSet};
use crate::render::{PageError, RenderedPage, Renderer};
use crate::url::{is_same_host, page_path, resolve_link};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Selector for elements carrying a class attribute
pub(crate) const CLASS_SELECTOR: &str = "[class]";

/// Selector for anchors carrying a link target
pub(crate) const LINK_SELECTOR: &str = "a[href]";

/// Crawl-wide counters shared by all workers
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pub pages_visited: AtomicUsize,
    pub pages_failed: AtomicUsize,
    pub links_admitted: AtomicUsize,
    pub duplicates_rejected: AtomicUsize,
    pub rejected_by_limit: AtomicUsize,
    pub offsite_ignored: AtomicUsize,
    pub elements_skipped: AtomicUsize,
}

impl CrawlCounters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads a counter
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}

/// Everything one worker needs, shared with its siblings
pub(crate) struct WorkerContext<R: Renderer> {
    pub renderer: Arc<R>,
    pub root: Url,
    pub page_limit: usize,
    pub idle_timeout: Duration,
    pub stability_timeout: Duration,
    pub visited: Arc<VisitedSet>,
    pub frontier: Arc<Frontier>,
    pub observations: mpsc::Sender<ClassObservation>,
    pub counters: Arc<CrawlCounters>,
    pub cancel: CancellationToken,
}

impl<R: Renderer> Clone for WorkerContext<R> {
    fn clone(&self) -> Self {
        Self {
            renderer: Arc::clone(&self.renderer),
            root: self.root.clone(),
            page_limit: self.page_limit,
            idle_timeout: self.idle_timeout,
            stability_timeout: self.stability_timeout,
            visited: Arc::clone(&self.visited),
            frontier: Arc::clone(&self.frontier),
            observations: self.observations.clone(),
            counters: Arc::clone(&self.counters),
            cancel: self.cancel.clone(),
        }
    }
}

/// What one page contributed to the crawl
#[derive(Debug, Default)]
struct PageHarvest {
    classes: HashMap<String, usize>,
    links: Vec<String>,
}

/// Marks a dequeued page as handled when dropped, even if the worker panics
struct PageDone<'a>(&'a Frontier);

impl Drop for PageDone<'_> {
    fn drop(&mut self) {
        self.0.completed();
    }
}

/// Runs one worker until the frontier is drained or the crawl is cancelled
///
/// The idle timeout only ends a worker once no admitted page is in flight.
pub(crate) async fn run_worker<R: Renderer>(id: usize, ctx: WorkerContext<R>) {
    tracing::debug!("Worker {} started", id);

    loop {
        match ctx.frontier.next(ctx.idle_timeout, &ctx.cancel).await {
            Next::Page(url) => {
                let _done = PageDone(&ctx.frontier);
                ctx.process_page(id, &url).await;
            }
            Next::Idle if ctx.frontier.outstanding() > 0 => {
                tracing::debug!(
                    "Worker {} idle for {:?}, {} page(s) still in flight",
                    id,
                    ctx.idle_timeout,
                    ctx.frontier.outstanding()
                );
            }
            Next::Idle => {
                tracing::debug!("Worker {} idle for {:?}, exiting", id, ctx.idle_timeout);
                break;
            }
            Next::Drained => {
                tracing::debug!("Worker {} found the frontier drained", id);
                break;
            }
            Next::Cancelled => {
                tracing::debug!("Worker {} cancelled", id);
                break;
            }
        }
    }
}

impl<R: Renderer> WorkerContext<R> {
    async fn process_page(&self, id: usize, url: &Url) {
        let page = tokio::select! {
            _ = self.cancel.cancelled() => return,
            loaded = self.load(url) => loaded,
        };

        let page = match page {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Skipping page: {}", e);
                CrawlCounters::bump(&self.counters.pages_failed);
                return;
            }
        };

        if !is_same_host(&self.root, page.url()) {
            tracing::debug!("{} redirected off-host to {}, ignoring", url, page.url());
            CrawlCounters::bump(&self.counters.offsite_ignored);
            return;
        }

        let final_path = page_path(page.url());
        if final_path != page_path(url)
            && self.visited.try_admit(&final_path, self.page_limit) == Admission::AlreadyVisited
        {
            tracing::debug!("{} redirected to already visited {}", url, final_path);
            CrawlCounters::bump(&self.counters.duplicates_rejected);
            return;
        }

        let harvest = tokio::select! {
            _ = self.cancel.cancelled() => return,
            harvest = self.harvest(&page) => harvest,
        };

        let harvest = match harvest {
            Ok(harvest) => harvest,
            Err(e) => {
                tracing::warn!("No usage recorded for {}: {}", url, e);
                CrawlCounters::bump(&self.counters.pages_failed);
                return;
            }
        };

        let admitted = self.admit_links(page.url(), &harvest.links);
        drop(page);

        CrawlCounters::bump(&self.counters.pages_visited);
        tracing::info!(
            "Worker {} visited {} ({} classes, {} new links)",
            id,
            url,
            harvest.classes.len(),
            admitted.len()
        );

        self.frontier.spawn_enqueue(admitted, self.cancel.clone());
        self.publish(harvest.classes).await;
    }

    async fn load(&self, url: &Url) -> Result<R::Page, PageError> {
        let page = self.renderer.load(url).await?;
        page.wait_stable(self.stability_timeout).await?;
        Ok(page)
    }

    /// Collects class usage and link targets from a rendered page
    ///
    /// A failed DOM query voids the whole page; a failed attribute read only
    /// skips that element.
    async fn harvest(&self, page: &R::Page) -> Result<PageHarvest, PageError> {
        let class_elements = page.query_elements(CLASS_SELECTOR).await?;
        let link_elements = page.query_elements(LINK_SELECTOR).await?;

        let mut harvest = PageHarvest::default();

        for element in &class_elements {
            let value = match page.attribute(element, "class").await {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Skipping element on {}: {}", page.url(), e);
                    CrawlCounters::bump(&self.counters.elements_skipped);
                    continue;
                }
            };

            for class in element_classes(&value) {
                *harvest.classes.entry(class.to_string()).or_insert(0) += 1;
            }
        }

        for element in &link_elements {
            match page.attribute(element, "href").await {
                Ok(Some(href)) => harvest.links.push(href),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping link on {}: {}", page.url(), e);
                    CrawlCounters::bump(&self.counters.elements_skipped);
                }
            }
        }

        Ok(harvest)
    }

    /// Resolves, filters and admits discovered links
    fn admit_links(&self, base: &Url, hrefs: &[String]) -> Vec<Url> {
        let mut admitted = Vec::new();

        for href in hrefs {
            let Some(target) = resolve_link(href, base) else {
                tracing::debug!("Ignoring link '{}' on {}", href, base);
                continue;
            };

            if !is_same_host(&self.root, &target) {
                tracing::debug!("Ignoring off-host link {}", target);
                CrawlCounters::bump(&self.counters.offsite_ignored);
                continue;
            }

            match self.visited.try_admit(&page_path(&target), self.page_limit) {
                Admission::Admitted => {
                    tracing::debug!("Admitted {}", target);
                    CrawlCounters::bump(&self.counters.links_admitted);
                    self.frontier.admitted();
                    admitted.push(target);
                }
                Admission::AlreadyVisited => {
                    tracing::debug!("Already visited {}", target.path());
                    CrawlCounters::bump(&self.counters.duplicates_rejected);
                }
                Admission::LimitReached => {
                    tracing::debug!("Page limit reached, dropping {}", target);
                    CrawlCounters::bump(&self.counters.rejected_by_limit);
                }
            }
        }

        admitted
    }

    async fn publish(&self, classes: HashMap<String, usize>) {
        for (class, count) in classes {
            let observation = ClassObservation { class, count };
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                sent = self.observations.send(observation) => {
                    if sent.is_err() {
                        tracing::warn!("Aggregator stopped before all usage was published");
                        return;
                    }
                }
            }
        }
    }
}

/// Distinct class tokens of one `class` attribute value
pub(crate) fn element_classes(value: &str) -> HashSet<&str> {
    value.split_whitespace().collect()
}
