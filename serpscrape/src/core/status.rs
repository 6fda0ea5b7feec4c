//! Aggregation state machine.
//!
//! A query's page loop is always in exactly one [`Termination`] state.
//! It starts in `Fetching` and moves to a terminal state through the
//! guards in [`Termination::after_page`] and [`Termination::after_empty_page`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the page loop for a query is running or has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// More pages may be requested.
    Fetching,
    /// The last page held fewer results than requested.
    ShortPage,
    /// The upstream returned nothing, or no next offset exists.
    Exhausted,
    /// The requested number of results has been fetched.
    LimitReached,
    /// The maximum number of page fetches has been made.
    PageCapReached,
    /// A fetch failed or the query deadline expired.
    Error,
}

impl Default for Termination {
    fn default() -> Self {
        Self::Fetching
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching => write!(f, "fetching"),
            Self::ShortPage => write!(f, "short_page"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::LimitReached => write!(f, "limit_reached"),
            Self::PageCapReached => write!(f, "page_cap_reached"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Counters the transition guards look at after a page is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// Page size that was requested.
    pub page_size: usize,
    /// Raw results the page yielded, before cross-page de-duplication.
    pub fetched: usize,
    /// Results still wanted after this page.
    pub remaining: usize,
    /// Pages fetched so far, this one included.
    pub page_count: usize,
    /// Maximum number of pages allowed.
    pub max_pages: usize,
    /// Whether the sequencer produced a next offset.
    pub has_next_start: bool,
}

impl Termination {
    /// State after a page that produced no results.
    #[must_use]
    pub fn after_empty_page() -> Self {
        Self::Exhausted
    }

    /// State after a page that produced at least one result.
    ///
    /// A short page wins over every other guard: a partial page from the
    /// upstream means there is nothing further to fetch.
    #[must_use]
    pub fn after_page(progress: &PageProgress) -> Self {
        if progress.fetched < progress.page_size {
            Self::ShortPage
        } else if !progress.has_next_start {
            Self::Exhausted
        } else if progress.remaining == 0 {
            Self::LimitReached
        } else if progress.page_count >= progress.max_pages {
            Self::PageCapReached
        } else {
            Self::Fetching
        }
    }

    /// Returns true once the loop must stop.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Fetching)
    }

    /// Returns true if the query failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error)
    }
}
