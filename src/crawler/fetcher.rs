//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured default headers
//! - Rotating the User-Agent header on every attempt
//! - Retry logic with exponential backoff and jitter
//! - Error classification (transient vs terminal)

use crate::config::FetchConfig;
use crate::{ConfigError, FetchError, ScrapeError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Upper bound for a single backoff pause
const MAX_BACKOFF: Duration = Duration::from_secs(600);

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Page body content
    pub body: String,
}

/// Classified result of a single request
#[derive(Debug)]
pub enum AttemptOutcome {
    /// 2xx response with a readable body
    Success(FetchedPage),

    /// Rate limiting (429), unavailable service (503) or a network fault
    Transient(FetchError),

    /// Any other error status
    Terminal(FetchError),
}

impl AttemptOutcome {
    /// Classifies a response status that was not a success
    fn from_status(url: &Url, status: StatusCode) -> Self {
        let url = url.to_string();
        let status = status.as_u16();
        if status == StatusCode::TOO_MANY_REQUESTS.as_u16()
            || status == StatusCode::SERVICE_UNAVAILABLE.as_u16()
        {
            Self::Transient(FetchError::RateLimited { url, status })
        } else {
            Self::Terminal(FetchError::Status { url, status })
        }
    }
}

/// State of the retry loop for one URL
#[derive(Debug)]
pub enum RetryState {
    /// About to perform the given (1-based) attempt
    Attempting(u32),
    Succeeded(FetchedPage),
    /// Out of attempts; carries the last observed error
    Exhausted(FetchError),
}

/// How often and how patiently a URL is retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts
    pub max_retries: u32,

    /// Base of the exponential backoff, in seconds
    pub backoff_base: f64,

    /// Upper bound (exclusive) of the random jitter, in seconds
    pub backoff_jitter: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
            backoff_jitter: config.backoff_jitter,
        }
    }

    /// Pause after failed attempt `attempt`: `base^attempt + U[0, jitter)` seconds
    pub fn backoff<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let jitter = rng.gen::<f64>() * self.backoff_jitter;
        let secs = self.backoff_base.powi(exponent) + jitter;

        if !secs.is_finite() || secs >= MAX_BACKOFF.as_secs_f64() {
            return MAX_BACKOFF;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Moves the retry state machine forward after an attempt
    ///
    /// Both transient and terminal failures are retried until
    /// `max_retries` attempts have been made.
    pub fn transition(&self, attempt: u32, outcome: AttemptOutcome) -> RetryState {
        let error = match outcome {
            AttemptOutcome::Success(page) => return RetryState::Succeeded(page),
            AttemptOutcome::Transient(error) => error,
            AttemptOutcome::Terminal(error) => error,
        };

        if attempt >= self.max_retries {
            return RetryState::Exhausted(error);
        }

        tracing::debug!(
            "Attempt {}/{} failed: {}",
            attempt,
            self.max_retries,
            error
        );
        RetryState::Attempting(attempt + 1)
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client follows redirects, honors proxy environment variables and
/// sends the configured Accept-Language header. The User-Agent is set per
/// request by the [`Fetcher`].
///
/// # Example
///
/// ```
/// use sumi_scrape::config::FetchConfig;
/// use sumi_scrape::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, ScrapeError> {
    let mut headers = HeaderMap::new();
    let accept_language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
        ConfigError::Validation(format!(
            "Invalid accept_language {:?}: {}",
            config.accept_language, e
        ))
    })?;
    headers.insert(ACCEPT_LANGUAGE, accept_language);

    let client = Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches pages with User-Agent rotation and retry/backoff
///
/// The random source drives both User-Agent selection and backoff jitter;
/// pass a seeded [`StdRng`] through [`Fetcher::with_rng`] for reproducible
/// behavior.
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    user_agents: Vec<String>,
    rng: StdRng,
}

impl Fetcher {
    /// Creates a fetcher seeded from system entropy
    pub fn new(config: &FetchConfig) -> Result<Self, ScrapeError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &FetchConfig, rng: StdRng) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: build_http_client(config)?,
            policy: RetryPolicy::from_config(config),
            user_agents: config.user_agents.clone(),
            rng,
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying failed attempts with backoff
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return immediately |
    /// | HTTP 429 / 503 | Back off, retry |
    /// | Connection error, timeout, unreadable body | Back off, retry |
    /// | Other error status | Back off, retry |
    /// | `max_retries` attempts used | Return the last error |
    ///
    /// The pause after failed attempt `n` is `backoff_base^n` seconds plus a
    /// random jitter; there is no pause after the final attempt.
    pub async fn fetch(&mut self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut state = RetryState::Attempting(1);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    if attempt > 1 {
                        let wait = self.policy.backoff(attempt - 1, &mut self.rng);
                        tracing::debug!("Retrying {} in {:?}", url, wait);
                        tokio::time::sleep(wait).await;
                    }
                    let outcome = self.attempt(url).await;
                    self.policy.transition(attempt, outcome)
                }
                RetryState::Succeeded(page) => return Ok(page),
                RetryState::Exhausted(error) => return Err(error),
            };
        }
    }

    /// Performs a single GET request and classifies the result
    async fn attempt(&mut self, url: &Url) -> AttemptOutcome {
        let mut request = self.client.get(url.as_str());
        if let Some(user_agent) = self.user_agents.choose(&mut self.rng) {
            request = request.header(USER_AGENT, user_agent.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                return AttemptOutcome::Transient(FetchError::Transport {
                    url: url.to_string(),
                    source,
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            return AttemptOutcome::from_status(url, status);
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match response.text().await {
            Ok(body) => AttemptOutcome::Success(FetchedPage {
                final_url,
                status_code: status.as_u16(),
                content_type,
                body,
            }),
            Err(source) => AttemptOutcome::Transient(FetchError::Transport {
                url: url.to_string(),
                source,
            }),
        }
    }
}
