//! Crawl run statistics
//!
//! Counters collected by the crawl loop, plus a human-readable report.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters for one crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Pages taken from the frontier (each counts against the page budget)
    pub pages_attempted: u64,

    /// Pages fetched and turned into records
    pub pages_scraped: u64,

    /// Pages abandoned after the fetcher gave up
    pub pages_failed: u64,

    /// URLs ever queued, the seed included
    pub urls_enqueued: u64,

    /// Queue entries dropped because the URL was already processed
    pub duplicates_skipped: u64,

    /// Queue entries discarded when the run was interrupted
    pub urls_discarded: u64,

    /// The run was stopped before the frontier was exhausted
    pub interrupted: bool,
}

impl CrawlStats {
    /// Starts a new set of counters stamped with the current time
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_attempted: 0,
            pages_scraped: 0,
            pages_failed: 0,
            urls_enqueued: 0,
            duplicates_skipped: 0,
            urls_discarded: 0,
            interrupted: false,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run, once finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }

    /// Share of attempted pages that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_attempted == 0 {
            return 0.0;
        }
        (self.pages_scraped as f64 / self.pages_attempted as f64) * 100.0
    }
}

/// Prints crawl statistics in a human-readable format
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages attempted: {}", stats.pages_attempted);
    println!(
        "  Pages scraped: {} ({:.1}%)",
        stats.pages_scraped,
        stats.success_rate()
    );
    println!("  Pages failed: {}", stats.pages_failed);
    println!();

    println!("Frontier:");
    println!("  URLs queued: {}", stats.urls_enqueued);
    println!("  Duplicates skipped: {}", stats.duplicates_skipped);
    if stats.interrupted {
        println!("  Interrupted, {} queued URLs discarded", stats.urls_discarded);
    }
    println!();

    if let Some(duration) = stats.duration() {
        println!("Duration: {}s", duration.num_seconds());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats() {
        let stats = CrawlStats::start();
        assert_eq!(stats.pages_attempted, 0);
        assert!(stats.finished_at.is_none());
        assert!(stats.duration().is_none());
        assert!(!stats.interrupted);
    }

    #[test]
    fn test_finish_sets_duration() {
        let mut stats = CrawlStats::start();
        stats.finish();
        let duration = stats.duration().unwrap();
        assert!(duration >= chrono::Duration::zero());
    }

    #[test]
    fn test_success_rate() {
        let mut stats = CrawlStats::start();
        stats.pages_attempted = 10;
        stats.pages_scraped = 8;
        stats.pages_failed = 2;
        assert!((stats.success_rate() - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_pages() {
        assert_eq!(CrawlStats::start().success_rate(), 0.0);
    }
}
