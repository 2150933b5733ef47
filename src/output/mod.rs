//! Output module for sweep results and reports
//!
//! This module handles:
//! - Writing the unused-class file (one `.class` line per entry)
//! - Formatting the unused list as JSON for the console
//! - Generating markdown summaries of a sweep
//! - Recording crawl statistics

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary, SweepSummary};
pub use stats::{print_statistics, CrawlStatistics};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes one `.class` line per unused class
///
/// Returns the absolute path that was written.
pub fn write_unused_file(path: &Path, unused: &[String]) -> OutputResult<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let write_error = |source: std::io::Error| OutputError::Write {
        path: absolute.display().to_string(),
        source,
    };

    let file = File::create(&absolute).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    for class in unused {
        writeln!(writer, ".{}", class).map_err(write_error)?;
    }
    writer.flush().map_err(write_error)?;

    Ok(absolute)
}

/// Pretty-printed JSON array of unused classes
pub fn format_unused_json(unused: &[String]) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(unused)?)
}
