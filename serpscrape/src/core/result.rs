//! Result records and the batch output document.
//!
//! The serialized shape of [`QueryResult`] and [`PositionedResult`] is the
//! compatibility contract with downstream consumers; field names and order
//! must not change.

use serde::{Deserialize, Serialize};

use super::Termination;

/// An organic result as produced by an extractor, without a rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawResult {
    /// Result title.
    pub title: String,
    /// Target URL.
    pub url: String,
    /// Snippet text; empty when the page had none.
    pub description: String,
}

impl RawResult {
    /// Creates a new raw result.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
        }
    }

    /// Attaches an absolute position.
    #[must_use]
    pub fn at_position(self, position: usize) -> PositionedResult {
        PositionedResult {
            position,
            title: self.title,
            url: self.url,
            description: self.description,
        }
    }
}

/// A result with its absolute rank across every page of its query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedResult {
    /// 1-based rank.
    pub position: usize,
    /// Result title.
    pub title: String,
    /// Target URL.
    pub url: String,
    /// Snippet text.
    pub description: String,
}

/// What one fetch-and-extract cycle yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOutcome {
    /// Page results in upstream order, already truncated to the page size.
    pub results: Vec<RawResult>,
    /// Page number the sequencer assigns to the following page.
    pub next_page: Option<usize>,
    /// Offset of the following page, absent when the stream is exhausted.
    pub next_start: Option<usize>,
}

impl PageOutcome {
    /// Number of raw results on the page.
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.results.len()
    }
}

/// The aggregated outcome for one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// The keyword.
    pub query: String,
    /// Results ordered by position.
    pub results: Vec<PositionedResult>,
    /// Continuation page number, if one is exposed.
    pub next_page: Option<usize>,
    /// Continuation offset, if one is exposed.
    pub next_start: Option<usize>,
    /// Failure description when the query did not complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Why the page loop stopped. Not part of the serialized document.
    #[serde(skip)]
    pub termination: Option<Termination>,
}

impl QueryResult {
    /// Creates a completed result.
    #[must_use]
    pub fn completed(
        query: impl Into<String>,
        results: Vec<PositionedResult>,
        next: (Option<usize>, Option<usize>),
        termination: Termination,
    ) -> Self {
        Self {
            query: query.into(),
            results,
            next_page: next.0,
            next_start: next.1,
            error: None,
            termination: Some(termination),
        }
    }

    /// Creates a failed result with no results and no continuation.
    #[must_use]
    pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            next_page: None,
            next_start: None,
            error: Some(error.into()),
            termination: Some(Termination::Error),
        }
    }

    /// Creates a failed result that still carries what was collected.
    #[must_use]
    pub fn partial(
        query: impl Into<String>,
        results: Vec<PositionedResult>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            results,
            ..Self::failed(query, error)
        }
    }

    /// Whether the query failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether there are no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// The complete batch output: one [`QueryResult`] per input keyword, in
/// input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunOutput(Vec<QueryResult>);

impl RunOutput {
    /// Creates an empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a query result.
    pub fn push(&mut self, result: QueryResult) {
        self.0.push(result);
    }

    /// Number of query blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no query blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over query blocks in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, QueryResult> {
        self.0.iter()
    }

    /// Number of failed queries.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.0.iter().filter(|r| r.is_error()).count()
    }

    /// Total number of results across all queries.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.0.iter().map(QueryResult::len).sum()
    }

    /// Consumes the output into its query blocks.
    #[must_use]
    pub fn into_inner(self) -> Vec<QueryResult> {
        self.0
    }

    /// Serializes as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Vec<QueryResult>> for RunOutput {
    fn from(results: Vec<QueryResult>) -> Self {
        Self(results)
    }
}

impl FromIterator<QueryResult> for RunOutput {
    fn from_iter<I: IntoIterator<Item = QueryResult>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RunOutput {
    type Item = &'a QueryResult;
    type IntoIter = std::slice::Iter<'a, QueryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_positioned_result_field_order() {
        let r = RawResult::new("Nike", "https://www.nike.com/", "Just do it").at_position(1);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"position":1,"title":"Nike","url":"https://www.nike.com/","description":"Just do it"}"#
        );
    }

    #[test]
    fn test_completed_result_shape() {
        let result = QueryResult::completed(
            "nike shoes",
            vec![RawResult::new("t", "u", "d").at_position(1)],
            (None, None),
            Termination::ShortPage,
        );
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "query": "nike shoes",
                "results": [{"position": 1, "title": "t", "url": "u", "description": "d"}],
                "next_page": null,
                "next_start": null,
            })
        );
    }

    #[test]
    fn test_failed_result_shape() {
        let value = serde_json::to_value(QueryResult::failed("q", "boom")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "query": "q",
                "results": [],
                "next_page": null,
                "next_start": null,
                "error": "boom",
            })
        );
    }

    #[test]
    fn test_partial_keeps_results() {
        let result = QueryResult::partial("q", vec![RawResult::new("t", "u", "").at_position(1)], "late failure");
        assert!(result.is_error());
        assert_eq!(result.len(), 1);
        assert_eq!(result.termination, Some(Termination::Error));
    }

    #[test]
    fn test_run_output_is_json_array() {
        let output: RunOutput = vec![
            QueryResult::failed("a", "x"),
            QueryResult::completed("b", Vec::new(), (None, None), Termination::Exhausted),
        ]
        .into();

        let value = serde_json::to_value(&output).unwrap();
        assert!(value.is_array());
        assert_eq!(output.len(), 2);
        assert_eq!(output.failed_count(), 1);
    }

    #[test]
    fn test_non_ascii_is_preserved() {
        let output: RunOutput =
            vec![QueryResult::completed("café", Vec::new(), (None, None), Termination::Exhausted)]
                .into();
        let json = output.to_json_pretty().unwrap();
        assert!(json.contains("café"));
        assert!(json.contains("\n  {"));
    }
}
