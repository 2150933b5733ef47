//! URL handling module for Class-Sweep
//!
//! This module provides root URL normalization, link resolution, same-host
//! checks, and the path keys pages are deduplicated by.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_same_host};
pub use normalize::{normalize_root_url, page_path, resolve_link};
