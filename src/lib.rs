//! Sumi-Scrape: A polite, selector-driven web scraper
//!
//! This crate fetches pages starting from a seed URL, optionally follows
//! same-origin links and pagination controls, and turns every page into a
//! structured record using declarative CSS field rules.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Errors that stop a crawl before it starts
///
/// Once running, a crawl never fails: per-page [`FetchError`]s are logged and
/// skipped, and output errors are reported as [`output::OutputError`].
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse field rules: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for '{field}': {message}")]
    InvalidSelector { field: String, message: String },

    #[error("Invalid link pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Errors surfaced by the fetcher once its retries are exhausted
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Rate limited fetching {url} (HTTP {status})")]
    RateLimited { url: String, status: u16 },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },
}

impl FetchError {
    /// Returns true for failures that are expected to clear up on their own
    /// (rate limiting, unavailable service, network faults)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transport { .. })
    }

    /// The HTTP status carried by this error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// Result type alias for Sumi-Scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlRequest};
pub use crawler::{crawl, CrawlOutcome, FieldValue, PageRecord};
pub use self::url::{normalize_href, same_origin};
