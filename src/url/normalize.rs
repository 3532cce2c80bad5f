use crate::UrlError;
use url::Url;

/// Href prefixes that never lead to a fetchable page
const NON_NAVIGABLE_PREFIXES: &[&str] = &["mailto:", "tel:", "javascript:"];

/// Resolves a raw href found in a document against the page it came from
///
/// # Resolution Steps
///
/// 1. Trim whitespace; reject empty hrefs
/// 2. Reject fragment-only hrefs (`#section`)
/// 3. Reject `mailto:`, `tel:` and `javascript:` hrefs (case-insensitive)
/// 4. Resolve against `base` using RFC 3986 reference resolution
/// 5. Reject anything that did not resolve to an HTTP(S) URL
///
/// The result is not canonicalized further: query parameter order, trailing
/// slashes and fragments are kept exactly as resolved.
///
/// # Arguments
///
/// * `base` - The URL of the page the href was found on
/// * `href` - The raw attribute value
///
/// # Returns
///
/// * `Some(Url)` - The absolute URL to follow
/// * `None` - The href is not navigable or could not be resolved
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scrape::url::normalize_href;
///
/// let base = Url::parse("https://example.com/blog/post").unwrap();
/// let next = normalize_href(&base, " page-2 ").unwrap();
/// assert_eq!(next.as_str(), "https://example.com/blog/page-2");
///
/// assert!(normalize_href(&base, "#comments").is_none());
/// assert!(normalize_href(&base, "mailto:me@example.com").is_none());
/// ```
pub fn normalize_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if NON_NAVIGABLE_PREFIXES
        .iter()
        .any(|prefix| has_prefix_ignore_case(href, prefix))
    {
        return None;
    }

    match base.join(href) {
        Ok(resolved) if matches!(resolved.scheme(), "http" | "https") => Some(resolved),
        Ok(resolved) => {
            tracing::trace!("Ignoring non-HTTP link {}", resolved);
            None
        }
        Err(e) => {
            tracing::debug!("Could not resolve href {:?} against {}: {}", href, base, e);
            None
        }
    }
}

/// Parses and checks a seed URL supplied by the user
///
/// Seeds must be absolute HTTP(S) URLs with a host.
///
/// # Examples
///
/// ```
/// use sumi_scrape::url::parse_seed;
///
/// assert!(parse_seed("https://example.com/start").is_ok());
/// assert!(parse_seed("ftp://example.com/").is_err());
/// assert!(parse_seed("/relative").is_err());
/// ```
pub fn parse_seed(seed: &str) -> Result<Url, UrlError> {
    let url = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}
