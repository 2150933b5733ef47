//! Page-rendering backends
//!
//! The crawler never talks to HTTP or a browser directly. It drives a
//! [`Renderer`], which loads a URL into a [`RenderedPage`] that can be waited
//! on and queried like a DOM:
//!
//! - `http`: fetches HTML with reqwest and queries it with scraper
//! - `webdriver`: drives a real browser over WebDriver with fantoccini
//!
//! Backends are picked by configuration; the crawl engine is generic over
//! the trait and identical for both.

mod http;
mod webdriver;

pub use http::{build_http_client, HtmlElement, HttpPage, HttpRenderer, RequestPacer};
pub use webdriver::{WebDriverPage, WebDriverRenderer, WEBDRIVER_MAX_PARALLELISM};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors scoped to a single page or element
///
/// These never abort a crawl: the worker logs them and moves on.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Failed to load {url}: {message}")]
    Load { url: String, message: String },

    #[error("Page {url} did not settle: {message}")]
    Stability { url: String, message: String },

    #[error("DOM query '{selector}' failed: {message}")]
    Query { selector: String, message: String },

    #[error("Failed to read attribute '{name}': {message}")]
    Attribute { name: String, message: String },
}

/// Errors that prevent a backend from starting at all
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to connect to WebDriver at {url}: {message}")]
    WebDriver { url: String, message: String },

    #[error("Invalid root URL: {0}")]
    RootUrl(#[from] crate::UrlError),
}

/// Loads pages for the crawler
#[async_trait]
pub trait Renderer: Send + Sync + 'static {
    /// The loaded page type
    type Page: RenderedPage;

    /// Upper bound on useful parallelism for this backend
    ///
    /// The worker pool never exceeds `min(max_parallelism, available CPUs)`
    /// unless the configuration sets an explicit worker count.
    fn max_parallelism(&self) -> usize {
        4
    }

    /// Loads `url` and returns the rendered page
    async fn load(&self, url: &Url) -> Result<Self::Page, PageError>;
}

/// A loaded page that can be queried like a DOM
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// Handle to one element matched by a query
    type Element: Send + Sync;

    /// Final URL of the page, after redirects
    fn url(&self) -> &Url;

    /// Waits until the page stops changing, or fails after `timeout`
    async fn wait_stable(&self, timeout: Duration) -> Result<(), PageError>;

    /// Returns every element matching a CSS selector
    async fn query_elements(&self, selector: &str) -> Result<Vec<Self::Element>, PageError>;

    /// Reads an attribute of an element; `Ok(None)` if it is absent
    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, PageError>;
}

/// Resolves the worker pool size
///
/// An explicit `configured` count wins; otherwise the pool is
/// `min(backend_cap, available parallelism)`, and never smaller than one.
pub fn worker_count(configured: usize, backend_cap: usize) -> usize {
    if configured > 0 {
        return configured;
    }

    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    backend_cap.min(cpus).max(1)
}
