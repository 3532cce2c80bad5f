//! URL handling module for Sumi-Scrape
//!
//! This module resolves hrefs discovered in documents, validates seed URLs,
//! and answers same-origin questions for link following.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{host_slug, same_origin};
pub use normalize::{normalize_href, parse_seed};
