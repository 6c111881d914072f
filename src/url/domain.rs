use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use listing_sync::url::extract_host;
///
/// let url = Url::parse("https://WWW.Saramin.co.kr/zf_user").unwrap();
/// assert_eq!(extract_host(&url), Some("www.saramin.co.kr".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a URL string and extracts its host, if any
pub fn host_of(url_str: &str) -> Option<String> {
    Url::parse(url_str).ok().as_ref().and_then(extract_host)
}
