//! Browser page backend over WebDriver
//!
//! One WebDriver session is opened per worker. A page checks a session out
//! of the pool when it loads and hands it back when dropped, so two workers
//! never navigate the same browser window.

use crate::render::{PageError, RenderedPage, Renderer, SetupError};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use url::Url;

/// Ceiling on browser sessions before the CPU bound applies
pub const WEBDRIVER_MAX_PARALLELISM: usize = 4;

/// Delay between two DOM stability checks
const STABILITY_POLL: Duration = Duration::from_millis(250);

/// Reports readiness and DOM size in one round trip
const STABILITY_SCRIPT: &str =
    "return [document.readyState, document.getElementsByTagName('*').length];";

type SessionPool = Arc<Mutex<Vec<Client>>>;

/// Renderer driving real browsers through a WebDriver server
pub struct WebDriverRenderer {
    sessions: SessionPool,
    available: Arc<Semaphore>,
    session_count: usize,
}

impl WebDriverRenderer {
    /// Opens `sessions` browser sessions against `webdriver_url`
    ///
    /// Failing to open any session is fatal; sessions already opened are
    /// closed before the error is returned.
    pub async fn connect(webdriver_url: &str, sessions: usize) -> Result<Self, SetupError> {
        let wanted = sessions.max(1);
        let mut clients = Vec::with_capacity(wanted);

        for _ in 0..wanted {
            match ClientBuilder::native().connect(webdriver_url).await {
                Ok(client) => clients.push(client),
                Err(e) => {
                    for client in clients {
                        let _ = client.close().await;
                    }
                    return Err(SetupError::WebDriver {
                        url: webdriver_url.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Opened {} WebDriver session(s) at {}",
            clients.len(),
            webdriver_url
        );

        Ok(Self {
            session_count: clients.len(),
            available: Arc::new(Semaphore::new(clients.len())),
            sessions: Arc::new(Mutex::new(clients)),
        })
    }

    /// Number of browser sessions in the pool
    pub fn session_count(&self) -> usize {
        self.session_count
    }

    /// Closes every pooled session
    pub async fn shutdown(self) {
        let clients: Vec<Client> = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            sessions.drain(..).collect()
        };

        for client in clients {
            if let Err(e) = client.close().await {
                tracing::warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    type Page = WebDriverPage;

    fn max_parallelism(&self) -> usize {
        WEBDRIVER_MAX_PARALLELISM.min(self.session_count)
    }

    async fn load(&self, url: &Url) -> Result<WebDriverPage, PageError> {
        let load_error = |message: String| PageError::Load {
            url: url.to_string(),
            message,
        };

        let permit = self
            .available
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| load_error(e.to_string()))?;

        let client = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            sessions.pop()
        }
        .ok_or_else(|| load_error("no WebDriver session available".to_string()))?;

        // From here on the session goes back to the pool when `page` drops.
        let mut page = WebDriverPage {
            client,
            url: url.clone(),
            pool: self.sessions.clone(),
            _permit: permit,
        };

        page.client
            .goto(url.as_str())
            .await
            .map_err(|e| load_error(e.to_string()))?;

        match page.client.current_url().await {
            Ok(current) => page.url = current,
            Err(e) => tracing::debug!("Could not read current URL for {}: {}", url, e),
        }

        Ok(page)
    }
}

/// A page open in a checked-out browser session
pub struct WebDriverPage {
    client: Client,
    url: Url,
    pool: SessionPool,
    _permit: OwnedSemaphorePermit,
}

impl Drop for WebDriverPage {
    fn drop(&mut self) {
        // Runs before `_permit` is released, so a waiter always finds a session.
        let mut sessions = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.push(self.client.clone());
    }
}

#[async_trait]
impl RenderedPage for WebDriverPage {
    type Element = Element;

    fn url(&self) -> &Url {
        &self.url
    }

    async fn wait_stable(&self, timeout: Duration) -> Result<(), PageError> {
        let deadline = Instant::now() + timeout;
        let mut last_count: Option<u64> = None;

        loop {
            let sample = self
                .client
                .execute(STABILITY_SCRIPT, vec![])
                .await
                .map_err(|e| PageError::Stability {
                    url: self.url.to_string(),
                    message: e.to_string(),
                })?;

            let ready = sample.get(0).and_then(|v| v.as_str()) == Some("complete");
            let count = sample.get(1).and_then(|v| v.as_u64());

            if ready && count.is_some() && count == last_count {
                return Ok(());
            }
            last_count = count;

            if Instant::now() >= deadline {
                return Err(PageError::Stability {
                    url: self.url.to_string(),
                    message: format!("still changing after {:?}", timeout),
                });
            }

            tokio::time::sleep(STABILITY_POLL).await;
        }
    }

    async fn query_elements(&self, selector: &str) -> Result<Vec<Element>, PageError> {
        self.client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| PageError::Query {
                selector: selector.to_string(),
                message: e.to_string(),
            })
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>, PageError> {
        element.attr(name).await.map_err(|e| PageError::Attribute {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}
