//! HTTP page backend
//!
//! This backend handles:
//! - Building an HTTP client with a proper user agent string
//! - Pacing requests so the target site sees a minimum delay between them
//! - GET requests, with non-2xx and non-HTML responses treated as failures
//! - Answering DOM queries by parsing the body with scraper
//!
//! Pages are static once fetched, so `wait_stable` returns immediately.

use crate::config::UserAgentConfig;
use crate::render::{PageError, RenderedPage, Renderer};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Ceiling on HTTP workers before the CPU bound applies
const HTTP_MAX_PARALLELISM: usize = 8;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use class_sweep::config::UserAgentConfig;
/// use class_sweep::render::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(format_user_agent(config))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Format: CrawlerName/Version (+ContactURL; ContactEmail)
fn format_user_agent(config: &UserAgentConfig) -> String {
    if config.contact_email.is_empty() {
        format!(
            "{}/{} (+{})",
            config.crawler_name, config.crawler_version, config.contact_url
        )
    } else {
        format!(
            "{}/{} (+{}; {})",
            config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
        )
    }
}

/// Enforces a minimum delay between consecutive requests
///
/// Each caller reserves the next free slot under the lock and sleeps outside
/// of it, so concurrent workers are spread out rather than serialized on the
/// lock.
#[derive(Debug)]
pub struct RequestPacer {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Creates a pacer; a zero delay disables pacing
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits until this caller may send its request
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }

        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            *next_slot = Some(slot + self.delay);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}

/// Renderer fetching pages over plain HTTP
#[derive(Debug)]
pub struct HttpRenderer {
    client: Client,
    pacer: RequestPacer,
}

impl HttpRenderer {
    /// Creates a renderer with a freshly built client
    pub fn new(user_agent: &UserAgentConfig, request_delay: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(user_agent)?, request_delay))
    }

    /// Creates a renderer around an existing client
    pub fn with_client(client: Client, request_delay: Duration) -> Self {
        Self {
            client,
            pacer: RequestPacer::new(request_delay),
        }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    type Page = HttpPage;

    fn max_parallelism(&self) -> usize {
        HTTP_MAX_PARALLELISM
    }

    async fn load(&self, url: &Url) -> Result<HttpPage, PageError> {
        self.pacer.wait().await;

        let load_error = |message: String| PageError::Load {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    load_error("Request timeout".to_string())
                } else if e.is_connect() {
                    load_error("Connection refused".to_string())
                } else {
                    load_error(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(load_error(format!("HTTP {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(load_error(format!("Expected HTML, got '{}'", content_type)));
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| load_error(e.to_string()))?;

        Ok(HttpPage {
            url: final_url,
            body,
        })
    }
}

/// An HTML document fetched over HTTP
#[derive(Debug, Clone)]
pub struct HttpPage {
    url: Url,
    body: String,
}

impl HttpPage {
    /// Wraps an already fetched document
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }
}

/// Snapshot of one matched element's attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    attributes: Vec<(String, String)>,
}

impl HtmlElement {
    /// Returns the value of an attribute, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Runs a selector over an HTML document
///
/// `Html` is not `Send`, so parsing stays inside this synchronous helper and
/// only owned snapshots cross await points.
fn select_elements(body: &str, selector: &str) -> Result<Vec<HtmlElement>, PageError> {
    let parsed = Selector::parse(selector).map_err(|e| PageError::Query {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })?;

    let document = Html::parse_document(body);
    let elements = document
        .select(&parsed)
        .map(|element| HtmlElement {
            attributes: element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        })
        .collect();

    Ok(elements)
}

#[async_trait]
impl RenderedPage for HttpPage {
    type Element = HtmlElement;

    fn url(&self) -> &Url {
        &self.url
    }

    async fn wait_stable(&self, _timeout: Duration) -> Result<(), PageError> {
        Ok(())
    }

    async fn query_elements(&self, selector: &str) -> Result<Vec<HtmlElement>, PageError> {
        select_elements(&self.body, selector)
    }

    async fn attribute(
        &self,
        element: &HtmlElement,
        name: &str,
    ) -> Result<Option<String>, PageError> {
        Ok(element.attr(name).map(str::to_string))
    }
}
