//! What happens to already-collected results when a query fails part-way.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{PositionedResult, QueryResult};
use crate::errors::SerpError;

/// Policy for results collected before a query failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialResultPolicy {
    /// Drop everything; the query reports only its error (default).
    #[default]
    Discard,
    /// Keep the results collected so far next to the error.
    Keep,
}

impl fmt::Display for PartialResultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discard => write!(f, "discard"),
            Self::Keep => write!(f, "keep"),
        }
    }
}

/// A query that stopped with an error.
#[derive(Debug)]
pub struct QueryFailure {
    /// The keyword.
    pub query: String,
    /// What went wrong.
    pub error: SerpError,
    /// Results admitted before the failure, positions intact.
    pub partial: Vec<PositionedResult>,
}

impl QueryFailure {
    /// Creates a failure with no partial results.
    #[must_use]
    pub fn new(query: impl Into<String>, error: impl Into<SerpError>) -> Self {
        Self {
            query: query.into(),
            error: error.into(),
            partial: Vec::new(),
        }
    }

    /// Attaches the results collected before the failure.
    #[must_use]
    pub fn with_partial(mut self, partial: Vec<PositionedResult>) -> Self {
        self.partial = partial;
        self
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query '{}' failed: {}", self.query, self.error)
    }
}

impl std::error::Error for QueryFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl PartialResultPolicy {
    /// Converts a failure into the query's output slot.
    #[must_use]
    pub fn resolve(self, failure: QueryFailure) -> QueryResult {
        let message = failure.error.to_string();
        match self {
            Self::Discard => QueryResult::failed(failure.query, message),
            Self::Keep => QueryResult::partial(failure.query, failure.partial, message),
        }
    }
}
