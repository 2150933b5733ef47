use crate::config::types::{BackendConfig, BackendKind, Config, CrawlerConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS: usize = 64;

/// Smallest accepted timeout, in milliseconds
const MIN_TIMEOUT_MS: u64 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_backend_config(&config.backend)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let root = config.root_url.as_deref().unwrap_or("").trim();
    if root.is_empty() {
        return Err(ConfigError::Validation(
            "root_url must be set (config file or --url)".to_string(),
        ));
    }

    // Scheme-less roots are completed later; only reject what can never parse.
    crate::url::normalize_root_url(root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root_url '{}': {}", root, e)))?;

    if config.max_workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 0 and {}, got {}",
            MAX_WORKERS, config.max_workers
        )));
    }

    if config.idle_timeout < MIN_TIMEOUT_MS {
        return Err(ConfigError::Validation(format!(
            "idle_timeout must be >= {}ms, got {}ms",
            MIN_TIMEOUT_MS, config.idle_timeout
        )));
    }

    if config.stability_timeout < MIN_TIMEOUT_MS {
        return Err(ConfigError::Validation(format!(
            "stability_timeout must be >= {}ms, got {}ms",
            MIN_TIMEOUT_MS, config.stability_timeout
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue_capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    Ok(())
}

/// Validates backend configuration
fn validate_backend_config(config: &BackendConfig) -> Result<(), ConfigError> {
    if config.kind == BackendKind::WebDriver {
        let url = Url::parse(&config.webdriver_url).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid webdriver_url '{}': {}",
                config.webdriver_url, e
            ))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "webdriver_url '{}' must use http or https",
                config.webdriver_url
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if !config.contact_email.is_empty() {
        validate_email(&config.contact_email)?;
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.crawler.root_url = Some("https://example.com".to_string());
        config
    }

    #[test]
    fn test_default_config_with_root_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_root_url() {
        let config = Config::default();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_unparsable_root_url() {
        let mut config = valid_config();
        config.crawler.root_url = Some("https://exa mple.com".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_worker_bounds() {
        let mut config = valid_config();
        config.crawler.max_workers = MAX_WORKERS;
        assert!(validate(&config).is_ok());

        config.crawler.max_workers = MAX_WORKERS + 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_timeouts_too_small() {
        let mut config = valid_config();
        config.crawler.idle_timeout = 10;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.crawler.stability_timeout = 99;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_webdriver_url_checked_only_for_webdriver_backend() {
        let mut config = valid_config();
        config.backend.webdriver_url = "not a url".to_string();
        assert!(validate(&config).is_ok());

        config.backend.kind = BackendKind::WebDriver;
        assert!(validate(&config).is_err());

        config.backend.webdriver_url = "ftp://localhost:4444".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_crawler_name_characters() {
        let mut config = valid_config();
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_empty_email_is_allowed() {
        let mut config = valid_config();
        config.user_agent.contact_email = String::new();
        assert!(validate(&config).is_ok());
    }
}
