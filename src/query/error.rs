//! Query error types.

use thiserror::Error;

/// Errors surfaced by query compilation.
///
/// Healed syntax never shows up here; it is reported as notices instead.
/// Invalid regexes and unknown filter fields are not errors either, they
/// simply match nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Syntax the parser cannot recover from; the query yields no results
    #[error("invalid query '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },

    /// More distinct terms than the configured limit allows
    #[error("query has {terms} distinct terms, limit is {limit}")]
    TooComplex { terms: usize, limit: usize },
}

impl QueryError {
    pub fn invalid(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            query: query.into(),
            reason: reason.into(),
        }
    }

    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Self::InvalidQuery { .. })
    }
}
