//! Free-text location lookup.
//!
//! [`Geocoder`] is the seam between the search controller and the HTTP
//! provider. [`validate`] is the synchronous gate used before a manual search.

use std::{fmt::Debug, sync::LazyLock};

use async_trait::async_trait;
use regex::Regex;

use crate::{error::SearchError, model::Place};

/// Shortest trimmed query `search` will send upstream.
pub const MIN_SEARCH_LEN: usize = 2;

/// Shortest trimmed query `suggest` will look up.
pub const MIN_SUGGEST_LEN: usize = 3;

/// Longest query `validate` accepts.
pub const MAX_QUERY_LEN: usize = 100;

static DANGEROUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)<script", r"(?i)javascript:", r"(?i)on\w+\s*=", r"(?i)data:"]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern is valid"))
        .collect()
});

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Resolve `text` into ranked place candidates.
    async fn search(&self, text: &str) -> Result<Vec<Place>, SearchError>;

    /// Best-effort lookup for autocomplete. Never fails: short input and
    /// every search error yield an empty list.
    async fn suggest(&self, text: &str) -> Vec<Place> {
        if text.trim().chars().count() < MIN_SUGGEST_LEN {
            return Vec::new();
        }

        match self.search(text).await {
            Ok(places) => places,
            Err(err) => {
                tracing::debug!(
                    query = text,
                    kind = %err.kind(),
                    "suggestion lookup failed: {err}"
                );
                Vec::new()
            }
        }
    }
}

/// Check a user-supplied query and return it trimmed.
pub fn validate(text: Option<&str>) -> Result<&str, SearchError> {
    let Some(raw) = text else {
        return Err(SearchError::InvalidInput("Please enter a location to search for".into()));
    };

    let trimmed = raw.trim();

    if trimmed.chars().count() < MIN_SEARCH_LEN {
        return Err(SearchError::InvalidInput(format!(
            "Search query must be at least {MIN_SEARCH_LEN} characters long"
        )));
    }

    if raw.chars().count() > MAX_QUERY_LEN {
        return Err(SearchError::InvalidInput(format!(
            "Search query must be at most {MAX_QUERY_LEN} characters long"
        )));
    }

    if DANGEROUS_PATTERNS.iter().any(|re| re.is_match(trimmed)) {
        return Err(SearchError::InvalidInput("Search query contains invalid characters".into()));
    }

    Ok(trimmed)
}
