//! Configuration module for Class-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every field has a default, so a crawl can run from command-line flags alone.
//!
//! # Example
//!
//! ```no_run
//! use class_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawler.page_limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackendConfig, BackendKind, Config, CrawlerConfig, InputConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, read_config, read_config_with_hash};
pub use validation::validate as validate_config;
