use url::Url;

/// Checks whether two URLs share the same origin
///
/// Two URLs share an origin when scheme, host and port are identical. The
/// port comparison uses the scheme's known default when no port is given, so
/// `http://example.com` and `http://example.com:80` are the same origin.
/// Path, query and fragment are ignored.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scrape::url::same_origin;
///
/// let seed = Url::parse("https://example.com/start").unwrap();
/// let page = Url::parse("https://example.com/other?q=1#x").unwrap();
/// assert!(same_origin(&seed, &page));
///
/// let insecure = Url::parse("http://example.com/start").unwrap();
/// assert!(!same_origin(&seed, &insecure));
/// ```
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Builds a filesystem-friendly name from a URL's host and port
///
/// Used for the default output directory. Returns `"unknown"` for URLs
/// without a host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scrape::url::host_slug;
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_slug(&url), "127.0.0.1_8080");
/// ```
pub fn host_slug(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}_{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => "unknown".to_string(),
    }
}
