use crate::UrlError;
use sha2::{Digest, Sha256};
use url::Url;

/// Normalizes a listing URL into its canonical form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP(S) or has no host
/// 3. Remove the query string
/// 4. Remove the fragment
///
/// Scheme, host and path are retained as parsed. The `url` crate already
/// lowercases the host and drops default ports, so two spellings of the same
/// listing collapse onto one canonical string.
///
/// # Examples
///
/// ```
/// use listing_sync::url::normalize_url;
///
/// let url = normalize_url("https://www.wanted.co.kr/wd/1234?utm_source=x#apply").unwrap();
/// assert_eq!(url.as_str(), "https://www.wanted.co.kr/wd/1234");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Returns the canonical string form of a listing URL
pub fn canonical_url(url_str: &str) -> Result<String, UrlError> {
    normalize_url(url_str).map(String::from)
}

/// Hashes an already canonical URL
///
/// SHA-256 over the UTF-8 bytes, rendered as 64 lowercase hex characters.
/// No salt is involved, so the key is stable across process restarts.
pub fn hash_canonical(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derives the identity key of a listing URL
///
/// # Examples
///
/// ```
/// use listing_sync::url::identity_key;
///
/// let a = identity_key("https://www.wanted.co.kr/wd/1234").unwrap();
/// let b = identity_key("https://www.wanted.co.kr/wd/1234?ref=main#top").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn identity_key(url_str: &str) -> Result<String, UrlError> {
    canonical_url(url_str).map(|canonical| hash_canonical(&canonical))
}
