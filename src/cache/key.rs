//! Logical request identity.
//!
//! # Design Decisions
//! - Query pairs are sorted by name (stable), so parameter order never splits the cache
//! - Every pair named after the upstream auth parameter is dropped: a
//!   client-supplied credential neither reaches the key nor the upstream
//! - The same key drives caching and collapsing

use axum::http::Uri;
use std::fmt;
use url::form_urlencoded;

/// Canonical identity of a downstream request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: String,
    params: Vec<(String, String)>,
    canonical: String,
}

impl CacheKey {
    /// Build a key from a path and raw query string.
    pub fn new(path: &str, query: Option<&str>, auth_param: &str) -> Self {
        let mut params: Vec<(String, String)> = query
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .filter(|(name, _)| name != auth_param)
                    .collect()
            })
            .unwrap_or_default();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical = if params.is_empty() {
            path.to_string()
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .finish();
            format!("{path}?{query}")
        };

        Self {
            path: path.to_string(),
            params,
            canonical,
        }
    }

    pub fn from_uri(uri: &Uri, auth_param: &str) -> Self {
        Self::new(uri.path(), uri.query(), auth_param)
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Client parameters in canonical order, auth parameter removed.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}
