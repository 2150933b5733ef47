//! Crawler module for site exploration and class counting
//!
//! This module contains the concurrent crawl engine, including:
//! - The visited-path registry and page budget
//! - The bounded frontier queue with its completion barrier
//! - The worker loop that renders pages and harvests classes and links
//! - The single-writer usage aggregator
//! - Overall crawl coordination

mod aggregator;
mod coordinator;
mod frontier;
mod visited;
mod worker;

pub use aggregator::{aggregate, spawn_aggregator, ClassObservation, UsageTable};
pub use coordinator::{find_unused, run_sweep, Coordinator, CrawlReport, CrawlSettings, SweepResult};
pub use frontier::{Frontier, Next};
pub use visited::{Admission, VisitedSet};
pub use worker::CrawlCounters;
