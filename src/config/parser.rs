use crate::config::types::{Config, FieldRuleSpec};
use crate::config::validation::validate;
use crate::ConfigError;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_scrape::config::load_config;
///
/// let config = load_config(Path::new("scrape.toml")).unwrap();
/// println!("Max pages: {}", config.crawl.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a set of results can be traced back to the exact
/// configuration that produced it.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Reads field rules given on the command line
///
/// The argument is treated as a path when a file of that name exists and as
/// inline JSON otherwise. Key order in the JSON object is kept.
///
/// # Example
///
/// ```
/// use sumi_scrape::config::load_field_rules;
///
/// let rules = load_field_rules(r#"{"title": {"css": "title"}, "links": {"css": "a", "attr": "href", "all": true}}"#).unwrap();
/// assert_eq!(rules.keys().collect::<Vec<_>>(), vec!["title", "links"]);
/// assert!(rules["links"].all);
/// ```
pub fn load_field_rules(arg: &str) -> Result<IndexMap<String, FieldRuleSpec>, ConfigError> {
    let path = Path::new(arg);
    let json = if path.is_file() {
        tracing::debug!("Reading field rules from {}", path.display());
        std::fs::read_to_string(path)?
    } else {
        arg.to_string()
    };

    Ok(serde_json::from_str(&json)?)
}
