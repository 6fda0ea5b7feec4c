//! Error types for serpscrape.
//!
//! Two classes of failure exist. Run-level failures (configuration and
//! validation) abort a batch before any request goes out. Query-level
//! failures (fetching, deadlines) are caught per keyword and recorded in
//! that keyword's output slot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for serpscrape operations.
#[derive(Debug, Error)]
pub enum SerpError {
    /// The settings file could not be read or parsed.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A run parameter was outside its allowed range.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A page fetch failed after the fetcher's own retries.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// A query did not finish before its deadline.
    #[error("Query '{query}' timed out after {seconds}s")]
    Timeout {
        /// The keyword being processed.
        query: String,
        /// The deadline in seconds.
        seconds: f64,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerpError {
    /// Whether this error only invalidates the query it occurred in.
    ///
    /// Query-scoped errors are recorded in the query's output slot; all
    /// others abort the run.
    #[must_use]
    pub fn is_query_scoped(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Timeout { .. })
    }

    /// Short machine-readable kind, used in event payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Validation(_) => "ValidationError",
            Self::Fetch(_) => "FetchError",
            Self::Timeout { .. } => "TimeoutError",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
        }
    }
}

impl From<serde_json::Error> for SerpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when a settings file cannot be loaded.
#[derive(Debug, Clone, Error)]
#[error("invalid settings file {}: {message}", path.display())]
pub struct ConfigError {
    /// The settings file path.
    pub path: PathBuf,
    /// What went wrong.
    pub message: String,
}

impl ConfigError {
    /// Creates a new config error.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Error raised when a run parameter is out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// The offending field (`start`, `limit` or `pages`).
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by a [`Fetcher`](crate::serp::Fetcher).
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The upstream answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Every attempt failed.
    #[error("Failed to fetch SERP after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: usize,
        /// Description of the final failure.
        last: String,
    },
}

impl FetchError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an exhausted-retries error.
    #[must_use]
    pub fn exhausted(attempts: usize, last: impl Into<String>) -> Self {
        Self::Exhausted {
            attempts,
            last: last.into(),
        }
    }

    /// Whether the upstream signalled rate limiting.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Http { status: 429, .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = SerpError> = std::result::Result<T, E>;
