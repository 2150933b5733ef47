//! Crawler coordinator - crawl orchestration
//!
//! The coordinator owns one crawl from start to finish:
//! - Validating the root URL and seeding the frontier with it
//! - Spawning the worker pool and the usage aggregator
//! - Waiting for the pool, then collecting the finished usage table
//! - Driving the crawl state machine to its terminal state

use crate::config::{Config, CrawlerConfig};
use crate::crawler::aggregator::{spawn_aggregator, UsageTable};
use crate::crawler::frontier::Frontier;
use crate::crawler::visited::VisitedSet;
use crate::crawler::worker::{run_worker, CrawlCounters, WorkerContext};
use crate::output::CrawlStatistics;
use crate::render::{worker_count, Renderer, SetupError};
use crate::state::{CrawlOutcome, CrawlState};
use crate::unused::unused_classes;
use crate::url::{normalize_root_url, page_path};
use crate::{ConfigError, SweepError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Tunables for a single crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Maximum number of distinct pages (0 = unbounded)
    pub page_limit: usize,

    /// Worker count (0 = derived from CPUs and the backend ceiling)
    pub workers: usize,

    pub idle_timeout: Duration,
    pub stability_timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

impl CrawlSettings {
    /// Builds settings from the `[crawler]` configuration section
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            page_limit: config.page_limit,
            workers: config.max_workers,
            idle_timeout: Duration::from_millis(config.idle_timeout),
            stability_timeout: Duration::from_millis(config.stability_timeout),
            queue_capacity: config.queue_capacity,
        }
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,
    pub usage: UsageTable,
    pub statistics: CrawlStatistics,
}

/// Result of a full sweep: the crawl plus the unused-class resolution
#[derive(Debug, Clone)]
pub struct SweepResult {
    /// Reference classes never seen on the site, in reference order
    pub unused: Vec<String>,

    /// Number of classes in the reference list
    pub reference_count: usize,

    pub report: CrawlReport,
}

/// Main crawler coordinator structure
pub struct Coordinator<R: Renderer> {
    renderer: Arc<R>,
    root: Url,
    settings: CrawlSettings,
    state: CrawlState,
}

impl<R: Renderer> Coordinator<R> {
    /// Creates a coordinator for one crawl
    ///
    /// An unparsable root URL is a fatal setup error.
    pub fn new(renderer: Arc<R>, root_url: &str, settings: CrawlSettings) -> Result<Self, SweepError> {
        let root = normalize_root_url(root_url).map_err(SetupError::RootUrl)?;

        Ok(Self {
            renderer,
            root,
            settings,
            state: CrawlState::Idle,
        })
    }

    /// Current crawl state
    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Normalized root URL
    pub fn root(&self) -> &Url {
        &self.root
    }

    fn transition(&mut self, next: CrawlState) -> Result<(), SweepError> {
        if !self.state.can_transition_to(next) {
            return Err(SweepError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!("Crawl state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// A coordinator crawls once; a second call is an invalid transition.
    /// A cancelled crawl still returns a report, with a partial usage table
    /// and `CrawlOutcome::Cancelled`.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<CrawlReport, SweepError> {
        self.transition(CrawlState::Crawling)?;

        let started_at = Utc::now();
        let crawl_cancel = cancel.child_token();
        let capacity = self.settings.queue_capacity.max(1);

        let visited = Arc::new(VisitedSet::new());
        let frontier = Arc::new(Frontier::new(capacity));
        let counters = Arc::new(CrawlCounters::default());
        let (observations, observation_rx) = mpsc::channel(capacity);
        let aggregator = spawn_aggregator(observation_rx);

        visited.try_admit(&page_path(&self.root), self.settings.page_limit);
        frontier.admitted();
        if !frontier.enqueue(self.root.clone(), &crawl_cancel).await {
            frontier.completed();
        }

        let workers = worker_count(self.settings.workers, self.renderer.max_parallelism());
        tracing::info!(
            "Starting crawl of {} with {} worker(s), page limit {}",
            self.root,
            workers,
            match self.settings.page_limit {
                0 => "none".to_string(),
                n => n.to_string(),
            }
        );

        let context = WorkerContext {
            renderer: Arc::clone(&self.renderer),
            root: self.root.clone(),
            page_limit: self.settings.page_limit,
            idle_timeout: self.settings.idle_timeout,
            stability_timeout: self.settings.stability_timeout,
            visited: Arc::clone(&visited),
            frontier: Arc::clone(&frontier),
            observations,
            counters: Arc::clone(&counters),
            cancel: crawl_cancel.clone(),
        };

        let mut pool = JoinSet::new();
        for id in 0..workers {
            pool.spawn(run_worker(id, context.clone()));
        }
        // The workers now hold the only observation senders.
        drop(context);

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        // Release any fan-out send still waiting on a full frontier.
        crawl_cancel.cancel();

        let usage = match aggregator.await {
            Ok(usage) => usage,
            Err(e) => {
                self.transition(CrawlState::Failed)?;
                return Err(SweepError::Task(format!("usage aggregator: {}", e)));
            }
        };

        let outcome = if cancel.is_cancelled() {
            CrawlOutcome::Cancelled
        } else {
            CrawlOutcome::Completed
        };
        self.transition(outcome.state())?;

        let statistics = CrawlStatistics {
            root_url: self.root.to_string(),
            workers,
            pages_visited: CrawlCounters::get(&counters.pages_visited),
            pages_failed: CrawlCounters::get(&counters.pages_failed),
            links_admitted: CrawlCounters::get(&counters.links_admitted),
            duplicates_rejected: CrawlCounters::get(&counters.duplicates_rejected),
            rejected_by_limit: CrawlCounters::get(&counters.rejected_by_limit),
            offsite_ignored: CrawlCounters::get(&counters.offsite_ignored),
            elements_skipped: CrawlCounters::get(&counters.elements_skipped),
            distinct_classes: usage.len(),
            started_at,
            finished_at: Utc::now(),
            outcome,
        };

        tracing::info!(
            "Crawl {}: {} pages visited, {} failed, {} distinct classes in {:.1}s",
            outcome,
            statistics.pages_visited,
            statistics.pages_failed,
            statistics.distinct_classes,
            statistics.duration_seconds()
        );

        Ok(CrawlReport {
            outcome,
            usage,
            statistics,
        })
    }
}

/// Crawls `root_url` and returns the reference classes never used
///
/// `page_limit == 0` means unbounded. A cancelled crawl is reported as
/// `SweepError::Cancelled`, since its usage table is incomplete.
///
/// # Example
///
/// ```no_run
/// use class_sweep::find_unused;
/// use class_sweep::config::UserAgentConfig;
/// use class_sweep::render::HttpRenderer;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let renderer = HttpRenderer::new(&UserAgentConfig::default(), Duration::from_millis(150))?;
/// let reference = vec!["btn".to_string(), "hero".to_string()];
/// let unused = find_unused(
///     Arc::new(renderer),
///     "example.com",
///     50,
///     &reference,
///     &CancellationToken::new(),
/// )
/// .await?;
/// println!("{:?}", unused);
/// # Ok(())
/// # }
/// ```
pub async fn find_unused<R: Renderer>(
    renderer: Arc<R>,
    root_url: &str,
    page_limit: usize,
    reference: &[String],
    cancel: &CancellationToken,
) -> Result<Vec<String>, SweepError> {
    let settings = CrawlSettings {
        page_limit,
        ..CrawlSettings::default()
    };

    let mut coordinator = Coordinator::new(renderer, root_url, settings)?;
    let report = coordinator.run(cancel).await?;

    if !report.outcome.is_complete() {
        return Err(SweepError::Cancelled);
    }

    Ok(unused_classes(reference, &report.usage))
}

/// Runs a configured sweep
///
/// Like [`find_unused`], but driven by a [`Config`] and returning the full
/// crawl report. With `allow-partial` set, a cancelled crawl yields a
/// best-effort result instead of an error.
pub async fn run_sweep<R: Renderer>(
    config: &Config,
    renderer: Arc<R>,
    reference: &[String],
    cancel: &CancellationToken,
) -> Result<SweepResult, SweepError> {
    let root_url = config
        .crawler
        .root_url
        .as_deref()
        .ok_or_else(|| ConfigError::Validation("crawler.root-url is required".to_string()))?;

    let settings = CrawlSettings::from_config(&config.crawler);
    let mut coordinator = Coordinator::new(renderer, root_url, settings)?;
    let report = coordinator.run(cancel).await?;

    if !report.outcome.is_complete() {
        if !config.crawler.allow_partial {
            return Err(SweepError::Cancelled);
        }
        tracing::warn!("Crawl was cancelled; reporting partial results");
    }

    Ok(SweepResult {
        unused: unused_classes(reference, &report.usage),
        reference_count: reference.len(),
        report,
    })
}
