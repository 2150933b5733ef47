//! Crawl statistics
//!
//! Counters gathered by the workers during one crawl, plus timing and the
//! outcome, with a plain-text rendering for the terminal.

use crate::state::CrawlOutcome;
use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Normalized root URL
    pub root_url: String,

    /// Size of the worker pool
    pub workers: usize,

    /// Pages rendered and harvested
    pub pages_visited: usize,

    /// Pages that failed to load or settle
    pub pages_failed: usize,

    /// Links admitted to the frontier
    pub links_admitted: usize,

    /// Links pointing at an already admitted path
    pub duplicates_rejected: usize,

    /// Links dropped because the page budget was spent
    pub rejected_by_limit: usize,

    /// Links to other hosts
    pub offsite_ignored: usize,

    /// Elements whose attributes could not be read
    pub elements_skipped: usize,

    /// Distinct class names seen across the site
    pub distinct_classes: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: CrawlOutcome,
}

impl CrawlStatistics {
    /// Wall-clock duration of the crawl
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Pages handled (visited or failed) per second
    pub fn pages_per_second(&self) -> f64 {
        let seconds = self.duration_seconds();
        if seconds > 0.0 {
            (self.pages_visited + self.pages_failed) as f64 / seconds
        } else {
            0.0
        }
    }

    /// Share of handled pages that loaded successfully, as a percentage
    pub fn success_rate(&self) -> f64 {
        let handled = self.pages_visited + self.pages_failed;
        if handled > 0 {
            (self.pages_visited as f64 / handled as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// Stdout is left to the unused-class listing so it can be piped.
pub fn print_statistics(stats: &CrawlStatistics) {
    eprintln!("=== Crawl Statistics ===\n");

    eprintln!("Overview:");
    eprintln!("  Root URL: {}", stats.root_url);
    eprintln!("  Outcome: {}", stats.outcome);
    eprintln!("  Workers: {}", stats.workers);
    eprintln!(
        "  Duration: {:.1}s ({:.2} pages/sec)",
        stats.duration_seconds(),
        stats.pages_per_second()
    );
    eprintln!();

    eprintln!("Pages:");
    eprintln!("  Visited: {}", stats.pages_visited);
    eprintln!("  Failed: {}", stats.pages_failed);
    eprintln!("  Success Rate: {:.1}%", stats.success_rate());
    eprintln!();

    eprintln!("Links:");
    eprintln!("  Admitted: {}", stats.links_admitted);
    eprintln!("  Duplicates: {}", stats.duplicates_rejected);
    eprintln!("  Over page limit: {}", stats.rejected_by_limit);
    eprintln!("  Off-host: {}", stats.offsite_ignored);
    eprintln!();

    eprintln!("Classes:");
    eprintln!("  Distinct classes seen: {}", stats.distinct_classes);
    if stats.elements_skipped > 0 {
        eprintln!("  Elements skipped: {}", stats.elements_skipped);
    }
}

#[cfg(test)]
pub(crate) fn sample_statistics() -> CrawlStatistics {
    let started_at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    CrawlStatistics {
        root_url: "https://example.com/".to_string(),
        workers: 4,
        pages_visited: 90,
        pages_failed: 10,
        links_admitted: 99,
        duplicates_rejected: 400,
        rejected_by_limit: 0,
        offsite_ignored: 25,
        elements_skipped: 0,
        distinct_classes: 120,
        started_at,
        finished_at: started_at + chrono::Duration::seconds(50),
        outcome: CrawlOutcome::Completed,
    }
}
