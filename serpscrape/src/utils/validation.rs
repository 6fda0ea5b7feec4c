//! Range validation for run parameters.
//!
//! Every check runs before the first request of a batch; a failure here
//! aborts the whole run.

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Allowed ranges for `start`, `limit` and `pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Smallest accepted start offset.
    pub min_start: i64,
    /// Smallest accepted result limit.
    pub min_limit: i64,
    /// Largest accepted result limit.
    pub max_limit: i64,
    /// Smallest accepted page cap.
    pub min_pages: i64,
    /// Largest accepted page cap.
    pub max_pages: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_start: 0,
            min_limit: 1,
            max_limit: 1000,
            min_pages: 1,
            max_pages: 20,
        }
    }
}

/// Validates `start`, `limit` and `pages`, in that order.
///
/// Returns the values converted to unsigned counts.
pub fn validate_run_params(
    start: i64,
    limit: i64,
    pages: i64,
    limits: &Limits,
) -> Result<(usize, usize, usize), ValidationError> {
    if start < limits.min_start {
        return Err(ValidationError::new(
            "start",
            format!("start must be >= {}", limits.min_start),
        ));
    }
    if !(limits.min_limit..=limits.max_limit).contains(&limit) {
        return Err(ValidationError::new(
            "limit",
            format!(
                "limit must be between {} and {}",
                limits.min_limit, limits.max_limit
            ),
        ));
    }
    if !(limits.min_pages..=limits.max_pages).contains(&pages) {
        return Err(ValidationError::new(
            "pages",
            format!(
                "pages must be between {} and {}",
                limits.min_pages, limits.max_pages
            ),
        ));
    }

    Ok((
        to_count("start", start)?,
        to_count("limit", limit)?,
        to_count("pages", pages)?,
    ))
}

fn to_count(field: &str, value: i64) -> Result<usize, ValidationError> {
    usize::try_from(value)
        .map_err(|_| ValidationError::new(field, format!("{field} must not be negative")))
}
