//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Managing the frontier queue and page budget
//! - Coordinating fetching, parsing, and field extraction
//! - Discovering pagination and same-origin links
//! - Politeness pauses and cooperative cancellation

use crate::config::{CrawlRequest, FetchConfig};
use crate::crawler::extractor::{extract, PageRecord};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::politeness::Politeness;
use crate::output::CrawlStats;
use crate::url::{normalize_href, same_origin};
use crate::ScrapeError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scraper::Html;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How often (in scraped pages) a progress line is logged
const PROGRESS_INTERVAL: u64 = 10;

/// Everything a crawl run produced
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Records in the order pages were scraped
    pub records: Vec<PageRecord>,
    pub stats: CrawlStats,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    request: CrawlRequest,
    fetcher: Fetcher,
    politeness: Politeness,
    rng: StdRng,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator with a fetcher built from `fetch_config`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScrapeError)` - The HTTP client could not be built
    pub fn new(request: CrawlRequest, fetch_config: &FetchConfig) -> Result<Self, ScrapeError> {
        let fetcher = Fetcher::new(fetch_config)?;
        Ok(Self::with_fetcher(request, fetcher, StdRng::from_entropy()))
    }

    /// Creates a coordinator around an existing fetcher
    ///
    /// `rng` drives the politeness jitter; seed it for reproducible runs.
    pub fn with_fetcher(request: CrawlRequest, fetcher: Fetcher, rng: StdRng) -> Self {
        let politeness = Politeness::new(request.delay, request.politeness_jitter);
        Self {
            request,
            fetcher,
            politeness,
            rng,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the crawl when cancelled
    ///
    /// The page being processed is finished, the remaining queue is dropped
    /// and the records collected so far are returned.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn request(&self) -> &CrawlRequest {
        &self.request
    }

    /// Runs the main crawl loop
    ///
    /// Per-page failures are logged and skipped; the run itself never fails.
    /// It ends when the frontier is empty, the page budget is spent, or the
    /// cancellation token fires.
    pub async fn run(&mut self) -> CrawlOutcome {
        tracing::info!(
            "Starting crawl at {} (max {} pages, crawl mode {})",
            self.request.seed,
            self.request.max_pages,
            if self.request.crawl { "on" } else { "off" }
        );

        let mut frontier = Frontier::new(self.request.seed.clone(), self.request.max_pages);
        let mut records = Vec::new();
        let mut stats = CrawlStats::start();
        let start_time = std::time::Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                stats.interrupted = true;
                stats.urls_discarded = frontier.clear() as u64;
                tracing::warn!(
                    "Crawl interrupted, discarding {} queued URLs",
                    stats.urls_discarded
                );
                break;
            }

            let url = match frontier.next() {
                Some(url) => url,
                None => {
                    if frontier.budget_exhausted() {
                        tracing::info!("Page budget of {} reached", self.request.max_pages);
                    } else {
                        tracing::info!("Frontier is empty, crawl complete");
                    }
                    break;
                }
            };

            stats.pages_attempted += 1;
            tracing::debug!("Processing URL: {}", url);

            let page = match self.fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", url, e);
                    stats.pages_failed += 1;
                    continue;
                }
            };

            if page.final_url != url.as_str() {
                tracing::debug!("{} redirected to {}", url, page.final_url);
            }

            records.push(self.process_document(&url, &page.body, &mut frontier));
            stats.pages_scraped += 1;

            if stats.pages_scraped % PROGRESS_INTERVAL == 0 {
                let rate = stats.pages_scraped as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {}/{} pages scraped, {} in frontier, {:.2} pages/sec",
                    stats.pages_scraped,
                    self.request.max_pages,
                    frontier.queued(),
                    rate
                );
            }

            if frontier.has_pending() {
                self.pause().await;
            }
        }

        stats.urls_enqueued = frontier.enqueued() as u64;
        stats.duplicates_skipped = frontier.duplicates_skipped() as u64;
        stats.finish();

        tracing::info!(
            "Crawl completed: {} pages scraped, {} failed, in {:?}",
            stats.pages_scraped,
            stats.pages_failed,
            start_time.elapsed()
        );

        CrawlOutcome { records, stats }
    }

    /// Parses a fetched page, extracts its record and queues discovered URLs
    ///
    /// Kept synchronous: the parsed document is not `Send` and must not be
    /// held across an await point.
    fn process_document(&self, url: &Url, body: &str, frontier: &mut Frontier) -> PageRecord {
        let document = Html::parse_document(body);

        let record = PageRecord {
            url: url.to_string(),
            fields: extract(&document, &self.request.fields),
        };

        self.discover_pagination(&document, url, frontier);
        if self.request.crawl {
            self.discover_links(&document, url, frontier);
        }

        record
    }

    /// Queues the target of the first pagination control, if any
    fn discover_pagination(&self, document: &Html, current: &Url, frontier: &mut Frontier) {
        let Some(selector) = &self.request.pagination_selector else {
            return;
        };

        let next = document
            .select(selector)
            .next()
            .and_then(|element| element.value().attr("href"))
            .and_then(|href| normalize_href(current, href));

        if let Some(next) = next {
            let next_page = next.to_string();
            if frontier.enqueue(next) {
                tracing::debug!("Queued next page {}", next_page);
            }
        }
    }

    /// Queues same-origin links that pass the optional link pattern
    fn discover_links(&self, document: &Html, current: &Url, frontier: &mut Frontier) {
        let mut queued = 0usize;

        for element in document.select(&self.request.link_selector) {
            let Some(link) = element
                .value()
                .attr("href")
                .and_then(|href| normalize_href(current, href))
            else {
                continue;
            };

            if !same_origin(&self.request.seed, &link) {
                continue;
            }

            if let Some(pattern) = &self.request.link_pattern {
                if !pattern.is_match(link.as_str()) {
                    continue;
                }
            }

            if frontier.enqueue(link) {
                queued += 1;
            }
        }

        tracing::debug!("Queued {} links from {}", queued, current);
    }

    /// Sleeps for the politeness delay, waking early on cancellation
    async fn pause(&mut self) {
        if self.politeness.is_zero() {
            return;
        }

        let wait = self.politeness.pause(&mut self.rng);
        tracing::trace!("Pausing {:?} before next page", wait);
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}

/// Runs a complete crawl operation
///
/// # Example
///
/// ```no_run
/// use sumi_scrape::config::{Config, CrawlRequest};
/// use sumi_scrape::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.crawl.seed = Some("https://example.com/".to_string());
/// let request = CrawlRequest::from_config(&config)?;
///
/// let outcome = run_crawl(request, &config.fetch).await?;
/// println!("{} records", outcome.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    request: CrawlRequest,
    fetch_config: &FetchConfig,
) -> Result<CrawlOutcome, ScrapeError> {
    let mut coordinator = Coordinator::new(request, fetch_config)?;
    Ok(coordinator.run().await)
}
