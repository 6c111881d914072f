/// Checks if a host matches a domain pattern
///
/// Patterns are either exact (`"wanted.co.kr"`) or wildcard
/// (`"*.wanted.co.kr"`). A wildcard pattern matches the bare domain as well as
/// any subdomain at any depth.
///
/// # Examples
///
/// ```
/// use listing_sync::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.wanted.co.kr", "www.wanted.co.kr"));
/// assert!(matches_wildcard("*.wanted.co.kr", "wanted.co.kr"));
/// assert!(!matches_wildcard("*.wanted.co.kr", "notwanted.co.kr"));
/// assert!(!matches_wildcard("wanted.co.kr", "www.wanted.co.kr"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base
            || (candidate.len() > base.len()
                && candidate.ends_with(base)
                && candidate.as_bytes()[candidate.len() - base.len() - 1] == b'.')
    } else {
        candidate == pattern
    }
}

/// Returns true if the host is covered by any pattern of the allow-list
pub fn host_allowed<S: AsRef<str>>(patterns: &[S], host: &str) -> bool {
    let host = host.to_lowercase();
    patterns
        .iter()
        .any(|pattern| matches_wildcard(&pattern.as_ref().to_lowercase(), &host))
}
