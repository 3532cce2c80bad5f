use crate::config::types::{Config, CrawlConfig, FetchConfig, FieldRuleSpec};
use crate::ConfigError;
use indexmap::IndexMap;
use reqwest::header::HeaderValue;

/// Field name reserved for the page URL in every record
pub const RESERVED_FIELD: &str = "url";

/// Validates the entire configuration
///
/// Only value ranges are checked here; selectors, the link pattern and the
/// seed URL are checked when the configuration is compiled into a
/// [`CrawlRequest`](crate::config::CrawlRequest).
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_fetch_config(&config.fetch)?;
    validate_field_rules(&config.fields)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    validate_seconds("delay", config.delay)?;
    validate_seconds("politeness_jitter", config.politeness_jitter)?;

    if config.link_css.trim().is_empty() {
        return Err(ConfigError::Validation(
            "link_css cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1 second, got {}",
            config.timeout
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    validate_seconds("backoff_base", config.backoff_base)?;
    validate_seconds("backoff_jitter", config.backoff_jitter)?;

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user_agents must contain at least one entry".to_string(),
        ));
    }

    if let Some(ua) = config.user_agents.iter().find(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "user_agents cannot contain blank entries, got {:?}",
            ua
        )));
    }

    let headers = config
        .user_agents
        .iter()
        .chain(std::iter::once(&config.accept_language));
    for value in headers {
        if HeaderValue::from_str(value).is_err() {
            return Err(ConfigError::Validation(format!(
                "{:?} is not a valid HTTP header value",
                value
            )));
        }
    }

    Ok(())
}

/// Validates field rule names
fn validate_field_rules(fields: &IndexMap<String, FieldRuleSpec>) -> Result<(), ConfigError> {
    for name in fields.keys() {
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "field names cannot be empty".to_string(),
            ));
        }

        if name == RESERVED_FIELD {
            return Err(ConfigError::Validation(format!(
                "field name '{}' is reserved for the page URL",
                RESERVED_FIELD
            )));
        }
    }

    Ok(())
}

/// Durations are given as seconds and must be finite and non-negative
fn validate_seconds(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, value
        )));
    }
    Ok(())
}
