use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use class_sweep::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `candidate` lives on the same host as `root`
///
/// Hosts are compared case-insensitively and the effective port must match,
/// so `http://localhost:8080` and `http://localhost:9090` are different sites.
pub fn is_same_host(root: &Url, candidate: &Url) -> bool {
    match (extract_domain(root), extract_domain(candidate)) {
        (Some(a), Some(b)) => a == b && root.port_or_known_default() == candidate.port_or_known_default(),
        _ => false,
    }
}
