//! Stylesheet class extraction
//!
//! Turns CSS text into the sorted, deduplicated list of class names it
//! declares. Extraction is lexical: any `.name` token outside comments
//! and `url(...)` bodies counts, and selector semantics are not interpreted.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

/// Matches a dot followed by a candidate class token
fn class_token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\.([A-Za-z0-9_-]+)").expect("valid class token regex"))
}

/// Matches CSS comments and `url(...)` bodies, which never declare classes
fn ignored_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?s)/\*.*?\*/|url\(\s*(?:"[^"]*"|'[^']*'|[^)]*)\s*\)"#)
            .expect("valid ignored-span regex")
    })
}

/// Returns true if `name` is a class identifier this tool reports on
///
/// Valid names match `[A-Za-z_][A-Za-z0-9_-]*`.
pub fn is_valid_class_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Extracts class names from CSS text
///
/// The result is sorted, contains no duplicates and no leading dots.
///
/// # Example
///
/// ```
/// use class_sweep::css::extract_class_names;
///
/// let css = ".btn { color: red } .btn-primary:hover, .btn { width: 1.5em }";
/// assert_eq!(extract_class_names(css), vec!["btn", "btn-primary"]);
/// ```
pub fn extract_class_names(css: &str) -> Vec<String> {
    let cleaned = ignored_regex().replace_all(css, " ");

    class_token_regex()
        .captures_iter(&cleaned)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| is_valid_class_name(name))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Reads a stylesheet from disk and extracts its class names
pub fn extract_class_names_from_file(path: &Path) -> std::io::Result<Vec<String>> {
    let css = std::fs::read_to_string(path)?;
    Ok(extract_class_names(&css))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn assert_sorted_unique(classes: &[String]) {
        for pair in classes.windows(2) {
            assert!(pair[0] < pair[1], "{:?} not strictly sorted", classes);
        }
        assert!(classes.iter().all(|c| !c.starts_with('.')));
    }

    #[test]
    fn test_basic_extraction() {
        let css = ".btn{} .btn-primary{} .unused-one{}";
        assert_eq!(
            extract_class_names(css),
            vec!["btn", "btn-primary", "unused-one"]
        );
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        let css = r#"
            .zeta, .alpha { margin: 0 }
            .alpha:hover { color: blue }
            div.zeta > .mid::before { content: "" }
        "#;
        let classes = extract_class_names(css);
        assert_eq!(classes, vec!["alpha", "mid", "zeta"]);
        assert_sorted_unique(&classes);
    }

    #[test]
    fn test_numbers_are_not_classes() {
        let css = ".grid { width: 1.5em; opacity: .75; margin: 0.5rem }";
        assert_eq!(extract_class_names(css), vec!["grid"]);
    }

    #[test]
    fn test_invalid_identifiers_dropped() {
        let css = ".-leading-dash {} .9lives {} ._private {} .ok_2 {}";
        assert_eq!(extract_class_names(css), vec!["_private", "ok_2"]);
    }

    #[test]
    fn test_comments_and_urls_ignored() {
        let css = r#"
            /* .commented-out { display: none } */
            .hero { background: url(images/hero.png) }
            .logo { background: url("logo.svg") }
        "#;
        assert_eq!(extract_class_names(css), vec!["hero", "logo"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_class_names("").is_empty());
        assert!(extract_class_names("body { margin: 0 }").is_empty());
    }

    #[test]
    fn test_media_queries() {
        let css = "@media (max-width: 600px) { .col { float: none } .row .col { width: 100% } }";
        assert_eq!(extract_class_names(css), vec!["col", "row"]);
    }

    #[test]
    fn test_is_valid_class_name() {
        assert!(is_valid_class_name("btn"));
        assert!(is_valid_class_name("_x"));
        assert!(is_valid_class_name("a-b_c9"));
        assert!(!is_valid_class_name(""));
        assert!(!is_valid_class_name("9a"));
        assert!(!is_valid_class_name("-a"));
    }

    #[test]
    fn test_extract_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b".b {} .a {} .b {}").unwrap();
        file.flush().unwrap();

        let classes = extract_class_names_from_file(file.path()).unwrap();
        assert_eq!(classes, vec!["a", "b"]);
    }

    #[test]
    fn test_extract_from_missing_file() {
        assert!(extract_class_names_from_file(Path::new("/nonexistent/style.css")).is_err());
    }
}
