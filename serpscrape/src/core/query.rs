//! Query and page request types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::ValidationError;
use crate::utils::{validate_run_params, Limits};

/// Largest page size the upstream search engine accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Request parameters handed to a fetcher. `None` values are dropped when
/// the request is built.
pub type RequestParams = BTreeMap<String, Option<String>>;

/// Raw, unvalidated run parameters as supplied by a caller or the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    /// Country code (`gl`).
    #[serde(default)]
    pub gl: Option<String>,
    /// Interface language (`hl`).
    #[serde(default)]
    pub hl: Option<String>,
    /// Time-based filter (`tbs`).
    #[serde(default)]
    pub tbs: Option<String>,
    /// Zero-based start offset.
    #[serde(default)]
    pub start: i64,
    /// Maximum number of results per query.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Maximum number of page fetches per query.
    #[serde(default = "default_pages")]
    pub pages: i64,
}

fn default_limit() -> i64 {
    20
}

fn default_pages() -> i64 {
    2
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            gl: None,
            hl: None,
            tbs: None,
            start: 0,
            limit: default_limit(),
            pages: default_pages(),
        }
    }
}

impl RunParams {
    /// Creates run parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the country code.
    #[must_use]
    pub fn with_gl(mut self, gl: impl Into<String>) -> Self {
        self.gl = Some(gl.into());
        self
    }

    /// Sets the interface language.
    #[must_use]
    pub fn with_hl(mut self, hl: impl Into<String>) -> Self {
        self.hl = Some(hl.into());
        self
    }

    /// Sets the time filter.
    #[must_use]
    pub fn with_tbs(mut self, tbs: impl Into<String>) -> Self {
        self.tbs = Some(tbs.into());
        self
    }

    /// Sets the start offset.
    #[must_use]
    pub fn with_start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Sets the result limit.
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the page cap.
    #[must_use]
    pub fn with_pages(mut self, pages: i64) -> Self {
        self.pages = pages;
        self
    }

    /// Validates against the default [`Limits`].
    pub fn validate(&self) -> Result<QueryOptions, ValidationError> {
        self.validate_with(&Limits::default())
    }

    /// Validates against custom limits.
    pub fn validate_with(&self, limits: &Limits) -> Result<QueryOptions, ValidationError> {
        let (start, limit, pages) = validate_run_params(self.start, self.limit, self.pages, limits)?;
        Ok(QueryOptions {
            gl: self.gl.clone(),
            hl: self.hl.clone(),
            tbs: self.tbs.clone(),
            start,
            limit,
            pages,
        })
    }
}

/// Validated per-run parameters shared by every query of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Country code (`gl`).
    pub gl: Option<String>,
    /// Interface language (`hl`).
    pub hl: Option<String>,
    /// Time-based filter (`tbs`).
    pub tbs: Option<String>,
    /// Zero-based start offset.
    pub start: usize,
    /// Maximum number of results.
    pub limit: usize,
    /// Maximum number of page fetches.
    pub pages: usize,
}

/// One keyword plus the options it runs with. Immutable for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The keyword text.
    pub text: String,
    /// Run options.
    pub options: QueryOptions,
}

impl Query {
    /// Creates a new query.
    #[must_use]
    pub fn new(text: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }

    /// Builds the request for one page at `start`.
    #[must_use]
    pub fn page_request(&self, start: usize, page_size: usize) -> PageRequest {
        PageRequest {
            query: self.text.clone(),
            gl: self.options.gl.clone(),
            hl: self.options.hl.clone(),
            tbs: self.options.tbs.clone(),
            start,
            page_size,
        }
    }
}

/// Parameters sent to the fetcher for a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// The keyword text.
    pub query: String,
    /// Country code.
    pub gl: Option<String>,
    /// Interface language.
    pub hl: Option<String>,
    /// Time filter.
    pub tbs: Option<String>,
    /// Zero-based offset.
    pub start: usize,
    /// Number of results requested (`num`), at most [`MAX_PAGE_SIZE`].
    pub page_size: usize,
}

impl PageRequest {
    /// Converts to the upstream query-string parameters.
    ///
    /// `uule` is always present and always `None`; it is reserved for
    /// encoded geo targeting.
    #[must_use]
    pub fn to_params(&self) -> RequestParams {
        let mut params = RequestParams::new();
        params.insert("q".to_string(), Some(self.query.clone()));
        params.insert("start".to_string(), Some(self.start.to_string()));
        params.insert("num".to_string(), Some(self.page_size.to_string()));
        params.insert("gl".to_string(), self.gl.clone());
        params.insert("hl".to_string(), self.hl.clone());
        params.insert("tbs".to_string(), self.tbs.clone());
        params.insert("uule".to_string(), None);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_params_defaults() {
        let params = RunParams::default();
        assert_eq!(params.start, 0);
        assert_eq!(params.limit, 20);
        assert_eq!(params.pages, 2);
    }

    #[test]
    fn test_validate_produces_options() {
        let options = RunParams::new()
            .with_gl("US")
            .with_hl("en")
            .with_start(10)
            .with_limit(50)
            .with_pages(3)
            .validate()
            .unwrap();

        assert_eq!(options.gl.as_deref(), Some("US"));
        assert_eq!(options.start, 10);
        assert_eq!(options.limit, 50);
        assert_eq!(options.pages, 3);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let err = RunParams::new().with_limit(0).validate().unwrap_err();
        assert_eq!(err.field, "limit");

        let err = RunParams::new().with_start(-1).validate().unwrap_err();
        assert_eq!(err.field, "start");
    }

    #[test]
    fn test_page_request_params() {
        let options = RunParams::new().with_hl("de").validate().unwrap();
        let query = Query::new("nike shoes", options);
        let params = query.page_request(20, 10).to_params();

        assert_eq!(params.get("q"), Some(&Some("nike shoes".to_string())));
        assert_eq!(params.get("start"), Some(&Some("20".to_string())));
        assert_eq!(params.get("num"), Some(&Some("10".to_string())));
        assert_eq!(params.get("hl"), Some(&Some("de".to_string())));
        assert_eq!(params.get("gl"), Some(&None));
        assert_eq!(params.get("uule"), Some(&None));
    }
}
