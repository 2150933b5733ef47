//! Class-Sweep: find the CSS classes a website never uses
//!
//! This crate crawls a site from a root URL with a bounded pool of workers,
//! counts the class names present in every visited page's DOM, and reports
//! which classes from a stylesheet never show up.

pub mod config;
pub mod crawler;
pub mod css;
pub mod output;
pub mod render;
pub mod state;
pub mod unused;
pub mod url;

use thiserror::Error;

/// Main error type for Class-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Setup error: {0}")]
    Setup(#[from] render::SetupError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Crawl was cancelled before it completed")]
    Cancelled,

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Class-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{find_unused, run_sweep, Coordinator, CrawlReport, SweepResult, UsageTable};
pub use css::{extract_class_names, extract_class_names_from_file};
pub use state::{CrawlOutcome, CrawlState};
pub use unused::unused_classes;
