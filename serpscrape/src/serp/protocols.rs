//! Protocol traits for the external capabilities the aggregation engine
//! consumes.
//!
//! A [`Fetcher`] performs one request for one page and owns all retry,
//! backoff and identity-rotation policy. An [`Extractor`] turns that page's
//! markup into result records and never fails.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::{RawResult, RequestParams};
use crate::errors::FetchError;

/// Protocol for fetching one page of search results.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `base_url` with `params` and returns the raw markup.
    ///
    /// Fails only after the implementation's own retry policy is exhausted.
    async fn fetch(&self, base_url: &str, params: &RequestParams) -> Result<String, FetchError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, base_url: &str, params: &RequestParams) -> Result<String, FetchError> {
        (**self).fetch(base_url, params).await
    }
}

/// Protocol for extracting organic results from page markup.
pub trait Extractor: Send + Sync {
    /// Extracts results in page order.
    ///
    /// Implementations must return an empty vector for unparseable input and
    /// must not return two results with the same URL.
    fn extract(&self, markup: &str) -> Vec<RawResult>;
}

impl<T: Extractor + ?Sized> Extractor for Arc<T> {
    fn extract(&self, markup: &str) -> Vec<RawResult> {
        (**self).extract(markup)
    }
}

/// Removes later results whose URL was already seen, keeping first-seen
/// order.
#[must_use]
pub fn dedup_by_url(results: Vec<RawResult>) -> Vec<RawResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct EchoExtractor;

    impl Extractor for EchoExtractor {
        fn extract(&self, markup: &str) -> Vec<RawResult> {
            markup
                .lines()
                .filter(|l| !l.is_empty())
                .map(|l| RawResult::new(l, l, ""))
                .collect()
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let results = vec![
            RawResult::new("A", "https://a.example/", "first"),
            RawResult::new("B", "https://b.example/", ""),
            RawResult::new("A again", "https://a.example/", "second"),
        ];

        let unique = dedup_by_url(results);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].description, "first");
        assert_eq!(unique[1].url, "https://b.example/");
    }

    #[test]
    fn test_dedup_empty() {
        assert!(dedup_by_url(Vec::new()).is_empty());
    }

    #[test]
    fn test_arc_extractor_delegates() {
        let extractor: Arc<dyn Extractor> = Arc::new(EchoExtractor);
        assert_eq!(extractor.extract("x\ny\n").len(), 2);
    }
}
