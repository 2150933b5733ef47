//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a sweep,
//! including run information, crawl statistics, and the unused classes.

use crate::output::stats::CrawlStatistics;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Unused classes listed before the summary truncates
const MAX_LISTED_CLASSES: usize = 200;

/// Everything the summary reports on
#[derive(Debug, Clone)]
pub struct SweepSummary {
    pub statistics: CrawlStatistics,

    /// Stylesheet the reference classes came from
    pub css_path: String,

    /// Number of classes in the stylesheet
    pub reference_count: usize,

    /// Unused classes, in stylesheet order
    pub unused: Vec<String>,

    /// SHA-256 of the config file, if one was used
    pub config_hash: Option<String>,
}

/// Generates a markdown summary and writes it to `output_path`
pub fn generate_markdown_summary(summary: &SweepSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a sweep summary as markdown
pub fn format_markdown_summary(summary: &SweepSummary) -> String {
    let stats = &summary.statistics;
    let mut md = String::new();

    md.push_str("# Class-Sweep Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Root URL**: {}\n", stats.root_url));
    md.push_str(&format!("- **Stylesheet**: {}\n", summary.css_path));
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", stats.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        stats.duration_seconds()
    ));
    md.push_str(&format!("- **Outcome**: {}\n", stats.outcome));
    md.push_str(&format!("- **Workers**: {}\n", stats.workers));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    if !stats.outcome.is_complete() {
        md.push_str("> The crawl was cancelled. Usage counts are partial, so some classes\n");
        md.push_str("> listed as unused may appear on pages that were never visited.\n\n");
    }

    // Page statistics
    md.push_str("## Crawl Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages visited | {} |\n", stats.pages_visited));
    md.push_str(&format!("| Pages failed | {} |\n", stats.pages_failed));
    md.push_str(&format!("| Links admitted | {} |\n", stats.links_admitted));
    md.push_str(&format!(
        "| Duplicate links | {} |\n",
        stats.duplicates_rejected
    ));
    md.push_str(&format!(
        "| Links over page limit | {} |\n",
        stats.rejected_by_limit
    ));
    md.push_str(&format!("| Off-host links | {} |\n", stats.offsite_ignored));
    md.push_str(&format!("| Elements skipped | {} |\n", stats.elements_skipped));
    md.push_str(&format!(
        "| Distinct classes seen | {} |\n\n",
        stats.distinct_classes
    ));

    // Class usage
    md.push_str("## Class Usage\n\n");
    let used = summary.reference_count.saturating_sub(summary.unused.len());
    md.push_str(&format!(
        "- **Stylesheet classes**: {}\n",
        summary.reference_count
    ));
    md.push_str(&format!("- **Used**: {}\n", used));
    md.push_str(&format!("- **Unused**: {}\n\n", summary.unused.len()));

    if !summary.unused.is_empty() {
        md.push_str("## Unused Classes\n\n");
        for class in summary.unused.iter().take(MAX_LISTED_CLASSES) {
            md.push_str(&format!("- `.{}`\n", class));
        }
        if summary.unused.len() > MAX_LISTED_CLASSES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.unused.len() - MAX_LISTED_CLASSES
            ));
        }
        md.push('\n');
    }

    md
}
