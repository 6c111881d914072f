//! URL handling module for Listing-Sync
//!
//! This module provides listing URL normalization, the identity hash derived
//! from the canonical form, host extraction and host allow-list matching.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_host, host_of};
pub use matcher::{host_allowed, matches_wildcard};
pub use normalize::{canonical_url, hash_canonical, identity_key, normalize_url};

/// A listing URL together with its canonical form and identity key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingIdentity {
    /// Canonical URL (query and fragment removed)
    pub canonical: String,
    /// Lowercase hex SHA-256 of the canonical URL
    pub hash: String,
}

impl ListingIdentity {
    /// Computes the identity of a raw listing URL
    pub fn of(url_str: &str) -> crate::UrlResult<Self> {
        let canonical = canonical_url(url_str)?;
        let hash = hash_canonical(&canonical);
        Ok(Self { canonical, hash })
    }
}
