use serde::Deserialize;

/// Main configuration structure for Class-Sweep
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub backend: BackendConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    #[serde(rename = "root-url")]
    pub root_url: Option<String>,

    /// Maximum number of distinct pages to visit (0 = unbounded)
    #[serde(rename = "page-limit")]
    pub page_limit: usize,

    /// Number of workers (0 = derived from CPU count and backend)
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// How long a worker waits for new work before exiting (milliseconds)
    #[serde(rename = "idle-timeout")]
    pub idle_timeout: u64,

    /// How long to wait for a loaded page to settle (milliseconds)
    #[serde(rename = "stability-timeout")]
    pub stability_timeout: u64,

    /// Capacity of the frontier channel
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: usize,

    /// Report results from an interrupted crawl instead of failing
    #[serde(rename = "allow-partial")]
    pub allow_partial: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root_url: None,
            page_limit: 0,
            max_workers: 0,
            idle_timeout: 10_000,
            stability_timeout: 5_000,
            queue_capacity: 256,
            allow_partial: false,
        }
    }
}

/// Which page-rendering backend drives the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Plain HTTP fetching with HTML parsing
    #[default]
    Http,
    /// A real browser driven over WebDriver
    WebDriver,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "webdriver" => Ok(Self::WebDriver),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::WebDriver => write!(f, "webdriver"),
        }
    }
}

/// Page-rendering backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// Minimum time between two HTTP requests (milliseconds)
    #[serde(rename = "request-delay")]
    pub request_delay: u64,

    /// WebDriver server endpoint
    #[serde(rename = "webdriver-url")]
    pub webdriver_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Http,
            request_delay: 150,
            webdriver_url: "http://localhost:4444".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact (optional)
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "class-sweep".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/class-sweep/class-sweep".to_string(),
            contact_email: String::new(),
        }
    }
}

/// Input configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Stylesheet whose classes are checked
    #[serde(rename = "css-path")]
    pub css_path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            css_path: "style.css".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File receiving one `.class` line per unused class
    #[serde(rename = "unused-path")]
    pub unused_path: Option<String>,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}
