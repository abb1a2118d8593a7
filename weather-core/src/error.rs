use thiserror::Error;

/// Fieldless discriminant of [`SearchError`], handy for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchErrorKind {
    InvalidInput,
    NoResults,
    Api,
    Network,
}

impl SearchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchErrorKind::InvalidInput => "invalid_input",
            SearchErrorKind::NoResults => "no_results",
            SearchErrorKind::Api => "api_error",
            SearchErrorKind::Network => "network_error",
        }
    }
}

impl std::fmt::Display for SearchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a location search.
///
/// Every variant carries a message that can be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The query was rejected before any request was made.
    #[error("{0}")]
    InvalidInput(String),

    /// The provider answered, but nothing matched the query.
    #[error("{0}")]
    NoResults(String),

    /// The provider answered with a non-success status.
    #[error("{0}")]
    Api(String),

    /// The request never produced a usable response.
    #[error("{0}")]
    Network(String),
}

impl SearchError {
    pub fn kind(&self) -> SearchErrorKind {
        match self {
            SearchError::InvalidInput(_) => SearchErrorKind::InvalidInput,
            SearchError::NoResults(_) => SearchErrorKind::NoResults,
            SearchError::Api(_) => SearchErrorKind::Api,
            SearchError::Network(_) => SearchErrorKind::Network,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SearchError::InvalidInput(msg)
            | SearchError::NoResults(msg)
            | SearchError::Api(msg)
            | SearchError::Network(msg) => msg,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Network(format!("Network error while searching locations: {err}"))
    }
}
