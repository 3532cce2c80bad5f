use indexmap::IndexMap;
use serde::Deserialize;

/// Identity strings rotated across fetch attempts
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/125.0",
];

/// Main configuration structure for Sumi-Scrape
///
/// Every section is optional; missing values fall back to the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,

    /// Field name → extraction rule, in declaration order
    pub fields: IndexMap<String, FieldRuleSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            fetch: FetchConfig::default(),
            output: OutputConfig::default(),
            fields: default_field_rules(),
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Page the crawl starts from
    pub seed: Option<String>,

    /// Follow same-origin links matched by `link_css`
    pub crawl: bool,

    /// Selector for links to follow in crawl mode
    pub link_css: String,

    /// Regex a followed link must match (search, not full match)
    pub link_pattern: Option<String>,

    /// Selector for a "next page" control
    pub pagination_css: Option<String>,

    /// Maximum number of pages visited
    pub max_pages: usize,

    /// Pause between pages (seconds)
    pub delay: f64,

    /// Upper bound of the random extra pause added to `delay` (seconds)
    pub politeness_jitter: f64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed: None,
            crawl: false,
            link_css: "a".to_string(),
            link_pattern: None,
            pagination_css: None,
            max_pages: 50,
            delay: 0.8,
            politeness_jitter: 0.3,
        }
    }
}

/// HTTP fetching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Per-attempt request timeout (seconds)
    pub timeout: u64,

    /// Total number of attempts per URL
    pub max_retries: u32,

    /// Base of the exponential backoff (seconds)
    pub backoff_base: f64,

    /// Upper bound of the random jitter added to each backoff (seconds)
    pub backoff_jitter: f64,

    /// Value of the Accept-Language header
    pub accept_language: String,

    /// Pool of User-Agent values; one is picked per attempt
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 20,
            max_retries: 3,
            backoff_base: 1.5,
            backoff_jitter: 1.0,
            accept_language: "en,fr;q=0.8".to_string(),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory for default output files (`<directory>/<host>/results.jsonl`)
    pub directory: String,

    /// Explicit output file; `.csv` selects CSV, anything else JSON Lines
    pub path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            path: None,
        }
    }
}

/// Declarative form of a field rule, as written in JSON or TOML
///
/// ```json
/// {"css": "a.product", "attr": "href", "all": true}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldRuleSpec {
    pub css: Option<String>,
    pub attr: Option<String>,
    pub all: bool,
}

impl FieldRuleSpec {
    pub fn css(css: &str) -> Self {
        Self {
            css: Some(css.to_string()),
            ..Self::default()
        }
    }
}

/// Rules used when none are configured: page title, first heading, and
/// every link on the page
pub fn default_field_rules() -> IndexMap<String, FieldRuleSpec> {
    let mut rules = IndexMap::new();
    rules.insert("title".to_string(), FieldRuleSpec::css("title"));
    rules.insert("h1".to_string(), FieldRuleSpec::css("h1"));
    rules.insert(
        "links_on_page".to_string(),
        FieldRuleSpec {
            css: Some("a".to_string()),
            attr: Some("href".to_string()),
            all: true,
        },
    );
    rules
}
