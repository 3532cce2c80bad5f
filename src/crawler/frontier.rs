//! Crawl frontier: FIFO work queue, seen-set and page budget
//!
//! URLs are marked as seen when they are dequeued for processing, not when
//! they are queued. The same URL may therefore sit in the queue several
//! times, but [`Frontier::next`] hands it out at most once. Deduplication is
//! keyed on the exact URL string.

use std::collections::{HashSet, VecDeque};
use url::Url;

#[derive(Debug)]
pub struct Frontier {
    seen: HashSet<String>,
    queue: VecDeque<Url>,
    max_pages: usize,
    enqueued: usize,
    duplicates_skipped: usize,
}

impl Frontier {
    /// Creates a frontier holding only the seed
    pub fn new(seed: Url, max_pages: usize) -> Self {
        Self {
            seen: HashSet::new(),
            queue: VecDeque::from([seed]),
            max_pages,
            enqueued: 1,
            duplicates_skipped: 0,
        }
    }

    /// Takes the next unseen URL and marks it as seen
    ///
    /// Already-seen URLs are discarded without consuming budget. Returns
    /// `None` once the queue is drained or `max_pages` URLs have been handed
    /// out.
    pub fn next(&mut self) -> Option<Url> {
        while !self.budget_exhausted() {
            let url = self.queue.pop_front()?;
            if self.seen.insert(url.as_str().to_string()) {
                return Some(url);
            }
            self.duplicates_skipped += 1;
            tracing::trace!("Skipping already visited {}", url);
        }
        None
    }

    /// Queues a URL unless it has already been processed
    ///
    /// Returns true when the URL was queued.
    pub fn enqueue(&mut self, url: Url) -> bool {
        if self.is_seen(&url) {
            return false;
        }
        tracing::trace!("Queued {}", url);
        self.queue.push_back(url);
        self.enqueued += 1;
        true
    }

    pub fn is_seen(&self, url: &Url) -> bool {
        self.seen.contains(url.as_str())
    }

    /// True once `max_pages` URLs have been handed out
    pub fn budget_exhausted(&self) -> bool {
        self.seen.len() >= self.max_pages
    }

    /// True when [`Frontier::next`] would return another URL
    pub fn has_pending(&self) -> bool {
        !self.budget_exhausted()
            && self
                .queue
                .iter()
                .any(|url| !self.seen.contains(url.as_str()))
    }

    /// Drops every queued URL, returning how many were discarded
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Number of URLs handed out so far
    pub fn visited(&self) -> usize {
        self.seen.len()
    }

    /// Number of entries currently in the queue (duplicates included)
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Number of URLs ever queued, the seed included
    pub fn enqueued(&self) -> usize {
        self.enqueued
    }

    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_skipped
    }
}
