//! Output sink trait and error types

use crate::crawler::PageRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for scraped records
///
/// Records arrive in crawl order and are written in that order.
pub trait RecordSink {
    /// Writes a batch of records
    fn write_records(&mut self, records: &[PageRecord]) -> OutputResult<()>;
}
