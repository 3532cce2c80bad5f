use crate::config::types::{Config, FieldRuleSpec};
use crate::config::validation::validate;
use crate::crawler::{FieldRule, FieldRules, Multiplicity};
use crate::url::parse_seed;
use crate::ConfigError;
use indexmap::IndexMap;
use regex::Regex;
use scraper::Selector;
use std::time::Duration;
use url::Url;

/// A validated, compiled description of one crawl run
///
/// Built once from a [`Config`] and never modified afterwards. Selectors and
/// the link pattern are compiled here, so the crawl loop never deals with
/// malformed rules.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Page the crawl starts from
    pub seed: Url,

    /// Field rules evaluated on every page
    pub fields: FieldRules,

    /// Follow same-origin links matched by `link_selector`
    pub crawl: bool,

    pub link_selector: Selector,

    /// Links must match this pattern to be followed
    pub link_pattern: Option<Regex>,

    /// Selector for a "next page" control, followed regardless of `crawl`
    pub pagination_selector: Option<Selector>,

    /// Maximum number of pages visited (including failed fetches)
    pub max_pages: usize,

    pub delay: Duration,
    pub politeness_jitter: Duration,
}

impl CrawlRequest {
    /// Validates a configuration and compiles it into a request
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlRequest)` - Ready-to-run request
    /// * `Err(ConfigError)` - Missing or invalid seed, selector, pattern or value
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_scrape::config::{Config, CrawlRequest};
    ///
    /// let mut config = Config::default();
    /// config.crawl.seed = Some("https://example.com/".to_string());
    /// config.crawl.pagination_css = Some("a.next".to_string());
    ///
    /// let request = CrawlRequest::from_config(&config).unwrap();
    /// assert_eq!(request.max_pages, 50);
    /// assert!(request.pagination_selector.is_some());
    /// ```
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        validate(config)?;

        let seed = config
            .crawl
            .seed
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("a seed URL is required".to_string()))?;
        let seed = parse_seed(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        let link_pattern = config
            .crawl
            .link_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()?;

        let pagination_selector = config
            .crawl
            .pagination_css
            .as_deref()
            .map(|css| compile_selector("pagination", css))
            .transpose()?;

        Ok(Self {
            seed,
            fields: compile_field_rules(&config.fields)?,
            crawl: config.crawl.crawl,
            link_selector: compile_selector("links", &config.crawl.link_css)?,
            link_pattern,
            pagination_selector,
            max_pages: config.crawl.max_pages,
            delay: seconds("delay", config.crawl.delay)?,
            politeness_jitter: seconds("politeness_jitter", config.crawl.politeness_jitter)?,
        })
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| ConfigError::Validation(format!("{} of {} seconds: {}", name, value, e)))
}

/// Compiles declarative field rules, keeping their order
pub fn compile_field_rules(
    specs: &IndexMap<String, FieldRuleSpec>,
) -> Result<FieldRules, ConfigError> {
    specs
        .iter()
        .map(|(name, spec)| -> Result<(String, FieldRule), ConfigError> {
            let selector = spec
                .css
                .as_deref()
                .filter(|css| !css.trim().is_empty())
                .map(|css| compile_selector(name, css))
                .transpose()?;

            let rule = FieldRule {
                selector,
                attribute: spec.attr.clone().filter(|a| !a.is_empty()),
                multiplicity: if spec.all {
                    Multiplicity::All
                } else {
                    Multiplicity::Single
                },
            };
            Ok((name.clone(), rule))
        })
        .collect()
}

fn compile_selector(field: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        field: field.to_string(),
        message: format!("{:?}: {:?}", css, e),
    })
}
