//! Class-Sweep main entry point
//!
//! This is the command-line interface for the Class-Sweep unused CSS finder.

use anyhow::Context;
use clap::Parser;
use class_sweep::config::{read_config_with_hash, validate_config, BackendKind, Config};
use class_sweep::output::{
    format_unused_json, generate_markdown_summary, print_statistics, write_unused_file,
    SweepSummary,
};
use class_sweep::render::{
    worker_count, HttpRenderer, Renderer, SetupError, WebDriverRenderer,
    WEBDRIVER_MAX_PARALLELISM,
};
use class_sweep::{extract_class_names_from_file, run_sweep, SweepResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Class-Sweep: find the CSS classes a website never uses
///
/// Class-Sweep crawls a site from a root URL, records every class name that
/// appears in the DOM of the pages it visits, and lists the classes from a
/// stylesheet that never show up.
#[derive(Parser, Debug)]
#[command(name = "class-sweep")]
#[command(version)]
#[command(about = "Find the CSS classes a website never uses", long_about = None)]
struct Cli {
    /// Root URL to crawl (https:// is assumed when no scheme is given)
    #[arg(long)]
    url: Option<String>,

    /// Path to the stylesheet whose classes are checked
    #[arg(long, value_name = "FILE")]
    css: Option<String>,

    /// Maximum number of pages to visit (0 = unbounded)
    #[arg(long)]
    limit: Option<usize>,

    /// Write unused classes to this file instead of printing them
    #[arg(long, value_name = "FILE")]
    out: Option<String>,

    /// Write a markdown summary to this file
    #[arg(long, value_name = "FILE")]
    summary: Option<String>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Page-rendering backend (http or webdriver)
    #[arg(long)]
    backend: Option<BackendKind>,

    /// WebDriver server endpoint
    #[arg(long, value_name = "URL")]
    webdriver_url: Option<String>,

    /// Number of crawl workers (0 = derived from CPUs)
    #[arg(long)]
    workers: Option<usize>,

    /// Report partial results when interrupted with Ctrl-C
    #[arg(long)]
    partial: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line flags over file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.crawler.root_url = Some(url.clone());
        }
        if let Some(css) = &self.css {
            config.input.css_path = css.clone();
        }
        if let Some(limit) = self.limit {
            config.crawler.page_limit = limit;
        }
        if let Some(out) = &self.out {
            config.output.unused_path = Some(out.clone());
        }
        if let Some(summary) = &self.summary {
            config.output.summary_path = Some(summary.clone());
        }
        if let Some(backend) = self.backend {
            config.backend.kind = backend;
        }
        if let Some(webdriver_url) = &self.webdriver_url {
            config.backend.webdriver_url = webdriver_url.clone();
        }
        if let Some(workers) = self.workers {
            config.crawler.max_workers = workers;
        }
        if self.partial {
            config.crawler.allow_partial = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = read_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    cli.apply_overrides(&mut config);
    validate_config(&config).context("Invalid configuration")?;

    let css_path = Path::new(&config.input.css_path);
    let reference = extract_class_names_from_file(css_path)
        .with_context(|| format!("Failed to extract classes from {}", css_path.display()))?;
    tracing::info!("Found {} classes in {}", reference.len(), css_path.display());

    if cli.dry_run {
        handle_dry_run(&config, reference.len());
        return Ok(());
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping crawl");
                cancel.cancel();
            }
        });
    }

    let result = match config.backend.kind {
        BackendKind::Http => {
            let renderer = HttpRenderer::new(
                &config.user_agent,
                Duration::from_millis(config.backend.request_delay),
            )
            .map_err(SetupError::HttpClient)?;
            sweep(&config, Arc::new(renderer), &reference, &cancel).await?
        }
        BackendKind::WebDriver => {
            let sessions = worker_count(config.crawler.max_workers, WEBDRIVER_MAX_PARALLELISM);
            let renderer =
                Arc::new(WebDriverRenderer::connect(&config.backend.webdriver_url, sessions).await?);
            let result = sweep(&config, Arc::clone(&renderer), &reference, &cancel).await;

            match Arc::try_unwrap(renderer) {
                Ok(renderer) => renderer.shutdown().await,
                Err(_) => tracing::warn!("WebDriver sessions still in use, not closing them"),
            }
            result?
        }
    };

    report(&config, config_hash, &result, cli.quiet)
}

/// Runs the sweep and logs its failure before handing it back
async fn sweep<R: Renderer>(
    config: &Config,
    renderer: Arc<R>,
    reference: &[String],
    cancel: &CancellationToken,
) -> anyhow::Result<SweepResult> {
    match run_sweep(config, renderer, reference, cancel).await {
        Ok(result) => Ok(result),
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("class_sweep=info,warn"),
            1 => EnvFilter::new("class_sweep=debug,info"),
            2 => EnvFilter::new("class_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, class_count: usize) {
    println!("=== Class-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Root URL: {}",
        config.crawler.root_url.as_deref().unwrap_or("-")
    );
    match config.crawler.page_limit {
        0 => println!("  Page limit: none"),
        n => println!("  Page limit: {}", n),
    }
    match config.crawler.max_workers {
        0 => println!("  Workers: derived from CPU count"),
        n => println!("  Workers: {}", n),
    }
    println!("  Idle timeout: {}ms", config.crawler.idle_timeout);
    println!("  Stability timeout: {}ms", config.crawler.stability_timeout);
    println!("  Queue capacity: {}", config.crawler.queue_capacity);
    println!("  Allow partial results: {}", config.crawler.allow_partial);

    println!("\nBackend:");
    println!("  Kind: {}", config.backend.kind);
    match config.backend.kind {
        BackendKind::Http => println!("  Request delay: {}ms", config.backend.request_delay),
        BackendKind::WebDriver => println!("  WebDriver URL: {}", config.backend.webdriver_url),
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    if !config.user_agent.contact_email.is_empty() {
        println!("  Contact Email: {}", config.user_agent.contact_email);
    }

    println!("\nInput:");
    println!("  Stylesheet: {} ({} classes)", config.input.css_path, class_count);

    println!("\nOutput:");
    println!(
        "  Unused classes: {}",
        config.output.unused_path.as_deref().unwrap_or("stdout")
    );
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
}

/// Writes the unused classes, the optional summary, and the statistics
fn report(
    config: &Config,
    config_hash: Option<String>,
    result: &SweepResult,
    quiet: bool,
) -> anyhow::Result<()> {
    match &config.output.unused_path {
        Some(path) => {
            let written = write_unused_file(Path::new(path), &result.unused)
                .context("Failed to write unused classes")?;
            println!("Wrote unused classes to {}", written.display());
        }
        None => {
            println!("Unused classes:");
            println!("{}", format_unused_json(&result.unused)?);
        }
    }

    if let Some(summary_path) = &config.output.summary_path {
        let summary = SweepSummary {
            statistics: result.report.statistics.clone(),
            css_path: config.input.css_path.clone(),
            reference_count: result.reference_count,
            unused: result.unused.clone(),
            config_hash,
        };
        generate_markdown_summary(&summary, Path::new(summary_path))
            .with_context(|| format!("Failed to write summary to {}", summary_path))?;
        tracing::info!("Summary written to {}", summary_path);
    }

    if !quiet {
        eprintln!();
        print_statistics(&result.report.statistics);
    }

    Ok(())
}
