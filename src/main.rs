//! Sumi-Scrape main entry point
//!
//! This is the command-line interface for the Sumi-Scrape page scraper.

use anyhow::Context;
use clap::Parser;
use std::future::Future;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use sumi_scrape::config::{load_config_with_hash, load_field_rules, Config, CrawlRequest};
use sumi_scrape::crawler::Coordinator;
use sumi_scrape::output::{default_output_path, print_statistics, write_output};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Scrape: A polite, selector-driven page scraper
///
/// Sumi-Scrape fetches a seed page, optionally follows same-origin links
/// and "next page" controls, and extracts named fields from every page
/// with CSS selectors. Results are written as JSON Lines or CSV.
#[derive(Parser, Debug)]
#[command(name = "sumi-scrape")]
#[command(version = "1.0.0")]
#[command(about = "A polite, selector-driven page scraper", long_about = None)]
struct Cli {
    /// Seed URL (prompted for when neither given here nor in the config)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Field rules as a JSON file or inline JSON object
    #[arg(long, value_name = "JSON|FILE")]
    selectors: Option<String>,

    /// Follow same-origin links found on each page
    #[arg(long)]
    crawl: bool,

    /// Selector for links to follow in crawl mode
    #[arg(long, value_name = "CSS")]
    link_css: Option<String>,

    /// Only follow links whose URL matches this regex
    #[arg(long, value_name = "REGEX")]
    link_pattern: Option<String>,

    /// Selector for the "next page" control
    #[arg(long, value_name = "CSS")]
    pagination_css: Option<String>,

    /// Maximum number of pages to visit
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Pause between pages in seconds
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Output file (.csv for CSV, anything else for JSON Lines)
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path).map_err(|e| {
                tracing::error!("Failed to load configuration: {}", e);
                e
            })?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli)?;

    if config.crawl.seed.is_none() {
        config.crawl.seed = Some(prompt_for_url()?);
    }

    let request = CrawlRequest::from_config(&config)?;
    let out_path = cli
        .out
        .clone()
        .or_else(|| config.output.path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| default_output_path(&config.output.directory, &request.seed));

    if cli.dry_run {
        handle_dry_run(&config, &request, &out_path);
        return Ok(());
    }

    handle_crawl(request, &config, out_path).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scrape=info,warn"),
            1 => EnvFilter::new("sumi_scrape=debug,info"),
            2 => EnvFilter::new("sumi_scrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Layers command-line flags over the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(url) = &cli.url {
        config.crawl.seed = Some(url.clone());
    }
    if let Some(selectors) = &cli.selectors {
        config.fields = load_field_rules(selectors)
            .with_context(|| format!("Failed to load field rules from {:?}", selectors))?;
    }
    if cli.crawl {
        config.crawl.crawl = true;
    }
    if let Some(css) = &cli.link_css {
        config.crawl.link_css = css.clone();
    }
    if let Some(pattern) = &cli.link_pattern {
        config.crawl.link_pattern = Some(pattern.clone());
    }
    if let Some(css) = &cli.pagination_css {
        config.crawl.pagination_css = Some(css.clone());
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }
    if let Some(delay) = cli.delay {
        config.crawl.delay = delay;
    }
    Ok(())
}

/// Asks for the seed URL on stdin
fn prompt_for_url() -> anyhow::Result<String> {
    print!("Start URL: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read start URL")?;

    let url = line.trim();
    anyhow::ensure!(!url.is_empty(), "No start URL given");
    Ok(url.to_string())
}

/// Handles the --dry-run mode: shows the resolved crawl request
fn handle_dry_run(config: &Config, request: &CrawlRequest, out_path: &std::path::Path) {
    println!("=== Sumi-Scrape Dry Run ===\n");

    println!("Crawl:");
    println!("  Seed: {}", request.seed);
    println!("  Crawl mode: {}", if request.crawl { "on" } else { "off" });
    println!("  Link selector: {}", config.crawl.link_css);
    if let Some(pattern) = &request.link_pattern {
        println!("  Link pattern: {}", pattern);
    }
    if let Some(css) = &config.crawl.pagination_css {
        println!("  Pagination selector: {}", css);
    }
    println!("  Max pages: {}", request.max_pages);
    println!(
        "  Delay: {:?} (+ up to {:?} jitter)",
        request.delay, request.politeness_jitter
    );

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout);
    println!("  Max retries: {}", config.fetch.max_retries);
    println!("  Backoff base: {}", config.fetch.backoff_base);
    println!("  User agents: {}", config.fetch.user_agents.len());

    println!("\nFields ({}):", config.fields.len());
    for (name, rule) in &config.fields {
        let attr = rule.attr.as_deref().unwrap_or("text");
        let many = if rule.all { "all" } else { "first" };
        println!("  - {}: {:?} -> {} ({})", name, rule.css, attr, many);
    }

    println!("\nOutput: {}", out_path.display());
    println!("\n✓ Configuration is valid");
}

/// Cancels the crawl on the first interrupt signal
///
/// Returns true once a second signal arrives, false if listening fails.
async fn watch_interrupts<S, F>(mut signal: S, cancel: CancellationToken) -> bool
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    if signal().await.is_err() {
        return false;
    }
    tracing::warn!("Interrupt received, finishing current page (press Ctrl+C again to abort)");
    cancel.cancel();

    signal().await.is_ok()
}

/// Handles the main crawl operation
async fn handle_crawl(
    request: CrawlRequest,
    config: &Config,
    out_path: PathBuf,
) -> anyhow::Result<()> {
    tracing::info!(
        "Fields: {}",
        request
            .fields
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut coordinator = Coordinator::new(request, &config.fetch)?;

    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, cancel).await {
            tracing::error!("Second interrupt received, aborting without writing output");
            std::process::exit(130);
        }
    });

    let outcome = coordinator.run().await;

    let format = write_output(&out_path, &outcome.records)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    tracing::info!("Wrote {} records as {:?}", outcome.records.len(), format);

    print_statistics(&outcome.stats);
    println!(
        "✓ Saved {} records to {}",
        outcome.records.len(),
        out_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_second_interrupt_aborts() {
        let cancel = CancellationToken::new();
        let calls = AtomicUsize::new(0);

        let abort = watch_interrupts(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
            cancel.clone(),
        )
        .await;

        assert!(abort);
        assert!(cancel.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_interrupt_only_cancels() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let watcher = tokio::spawn(watch_interrupts(
            {
                let mut first = true;
                move || {
                    let fire = std::mem::replace(&mut first, false);
                    async move {
                        if !fire {
                            std::future::pending::<()>().await;
                        }
                        Ok(())
                    }
                }
            },
            cancel,
        ));

        token.cancelled().await;
        assert!(!watcher.is_finished());
        watcher.abort();
    }

    #[tokio::test]
    async fn test_signal_setup_failure_is_ignored() {
        let cancel = CancellationToken::new();
        let abort = watch_interrupts(
            || async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signals")) },
            cancel.clone(),
        )
        .await;

        assert!(!abort);
        assert!(!cancel.is_cancelled());
    }
}
