//! Configuration module for Sumi-Scrape
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files and JSON field rules, and compiles them into a [`CrawlRequest`].
//!
//! # Example
//!
//! ```no_run
//! use sumi_scrape::config::{load_config, CrawlRequest};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scrape.toml")).unwrap();
//! let request = CrawlRequest::from_config(&config).unwrap();
//! println!("Crawl will visit at most {} pages", request.max_pages);
//! ```

mod parser;
mod request;
mod types;
mod validation;

// Re-export types
pub use request::{compile_field_rules, CrawlRequest};
pub use types::{
    default_field_rules, Config, CrawlConfig, FetchConfig, FieldRuleSpec, OutputConfig,
    DEFAULT_USER_AGENTS,
};
pub use validation::{validate, RESERVED_FIELD};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, load_field_rules};
