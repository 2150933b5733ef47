use crate::UrlError;
use url::Url;

/// Normalizes the root URL a crawl starts from
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Prefix `https://` when no scheme is given
/// 3. Parse the URL; reject if malformed
/// 4. Only HTTP and HTTPS are accepted (HTTP stays allowed for local servers)
/// 5. The URL must have a host
/// 6. Remove the fragment
///
/// # Examples
///
/// ```
/// use class_sweep::url::normalize_root_url;
///
/// let url = normalize_root_url("example.com/docs").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_root_url(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// The fragment of the resolved URL is removed.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);

    Some(absolute_url)
}

/// Returns the key a page is deduplicated by: its path
///
/// Query strings and fragments are ignored, and an empty path counts as `/`.
pub fn page_path(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/docs/page").unwrap()
    }

    #[test]
    fn test_root_without_scheme_gets_https() {
        let url = normalize_root_url("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_root_keeps_http() {
        let url = normalize_root_url("http://127.0.0.1:8080/").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.port(), Some(8080));
    }

    #[test]
    fn test_root_strips_fragment_and_whitespace() {
        let url = normalize_root_url("  https://example.com/a#top ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn test_root_rejects_other_schemes() {
        assert!(matches!(
            normalize_root_url("ftp://example.com/"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_root_rejects_garbage() {
        assert!(matches!(normalize_root_url(""), Err(UrlError::Parse(_))));
        assert!(matches!(
            normalize_root_url("https://exa mple.com"),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_resolve_relative_links() {
        assert_eq!(
            resolve_link("/other", &base_url()).unwrap().as_str(),
            "https://example.com/other"
        );
        assert_eq!(
            resolve_link("sibling", &base_url()).unwrap().as_str(),
            "https://example.com/docs/sibling"
        );
        assert_eq!(
            resolve_link("../up#frag", &base_url()).unwrap().as_str(),
            "https://example.com/up"
        );
    }

    #[test]
    fn test_resolve_skips_special_links() {
        for href in [
            "",
            "   ",
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:test@example.com",
            "tel:+1234567890",
            "data:text/html,<h1>x</h1>",
            "#section",
            "ftp://example.com/file",
        ] {
            assert!(resolve_link(href, &base_url()).is_none(), "{}", href);
        }
    }

    #[test]
    fn test_resolve_keeps_absolute_off_host_links() {
        // Host filtering is the caller's decision.
        let url = resolve_link("https://other.com/x", &base_url()).unwrap();
        assert_eq!(url.host_str(), Some("other.com"));
    }

    #[test]
    fn test_page_path_ignores_query_and_fragment() {
        let a = Url::parse("https://example.com/list?page=2#top").unwrap();
        let b = Url::parse("https://example.com/list").unwrap();
        assert_eq!(page_path(&a), page_path(&b));
        assert_eq!(page_path(&Url::parse("https://example.com").unwrap()), "/");
    }
}
