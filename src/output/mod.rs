//! Output module for writing scraped records and crawl statistics
//!
//! This module handles:
//! - Writing records as JSON Lines or CSV
//! - Choosing the output format and default location
//! - Reporting crawl statistics

mod csv_output;
mod jsonl_output;
pub mod stats;
mod traits;

pub use csv_output::CsvSink;
pub use jsonl_output::JsonLinesSink;
pub use stats::{print_statistics, CrawlStats};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::crawler::PageRecord;
use crate::url::host_slug;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use url::Url;

/// File name used when no output path is given
pub const DEFAULT_FILE_NAME: &str = "results.jsonl";

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    JsonLines,
    Csv,
}

impl OutputFormat {
    /// Picks the format from a file extension: `.csv` for CSV, anything
    /// else for JSON Lines
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::JsonLines,
        }
    }
}

/// Default output location: `<directory>/<host>/results.jsonl`
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use sumi_scrape::output::default_output_path;
/// use url::Url;
///
/// let seed = Url::parse("https://example.com:8443/shop").unwrap();
/// assert_eq!(
///     default_output_path("output", &seed),
///     Path::new("output/example.com_8443/results.jsonl")
/// );
/// ```
pub fn default_output_path(directory: &str, seed: &Url) -> PathBuf {
    Path::new(directory)
        .join(host_slug(seed))
        .join(DEFAULT_FILE_NAME)
}

/// Writes records to `path`, creating parent directories as needed
///
/// The format is chosen with [`OutputFormat::from_path`]. An empty record
/// list produces an empty file.
pub fn write_output(path: &Path, records: &[PageRecord]) -> OutputResult<OutputFormat> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = BufWriter::new(File::create(path)?);
    let format = OutputFormat::from_path(path);
    match format {
        OutputFormat::Csv => CsvSink::new(file).write_records(records)?,
        OutputFormat::JsonLines => JsonLinesSink::new(file).write_records(records)?,
    }

    tracing::debug!(
        "Wrote {} records to {} as {:?}",
        records.len(),
        path.display(),
        format
    );
    Ok(format)
}
