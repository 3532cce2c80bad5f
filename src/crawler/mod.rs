//! Crawler module for page fetching and field extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with User-Agent rotation and retry/backoff
//! - Selector-driven field extraction
//! - The frontier queue with deduplication and a page budget
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod politeness;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use extractor::{extract, FieldRule, FieldRules, FieldValue, Multiplicity, PageRecord};
pub use fetcher::{
    build_http_client, AttemptOutcome, FetchedPage, Fetcher, RetryPolicy, RetryState,
};
pub use frontier::Frontier;
pub use politeness::Politeness;

use crate::config::{CrawlRequest, FetchConfig};
use crate::ScrapeError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client from the fetch settings
/// 2. Fetch pages breadth-first from the seed
/// 3. Extract one record per successfully fetched page
/// 4. Follow pagination and, in crawl mode, same-origin links
///
/// # Arguments
///
/// * `request` - The validated crawl request
/// * `fetch` - HTTP client, retry and User-Agent settings
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Records and statistics of the run
/// * `Err(ScrapeError)` - The HTTP client could not be built
pub async fn crawl(request: CrawlRequest, fetch: &FetchConfig) -> Result<CrawlOutcome, ScrapeError> {
    run_crawl(request, fetch).await
}
