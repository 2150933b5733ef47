//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the crawl-level state machine (idle, crawling, terminal states)
//! - `CrawlOutcome`: how a crawl that reached the end of its worker pool finished

mod crawl_state;

pub use crawl_state::{CrawlOutcome, CrawlState};
