//! Scripted fetch and extract doubles.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::core::{RawResult, RequestParams};
use crate::errors::FetchError;
use crate::serp::{dedup_by_url, Extractor, Fetcher};

/// Encodes results as markup that [`PageExtractor`] decodes.
#[must_use]
pub fn encode_page(results: &[RawResult]) -> String {
    serde_json::to_string(results).unwrap_or_default()
}

/// A fetcher that replays scripted responses per keyword.
///
/// Each keyword has its own queue, so scripts stay deterministic when
/// queries run concurrently. An unscripted or drained keyword yields empty
/// markup.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
    requests: Mutex<Vec<RequestParams>>,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    /// Creates a fetcher with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a page of results for `query`, encoded with [`encode_page`].
    #[must_use]
    pub fn with_page(self, query: &str, results: Vec<RawResult>) -> Self {
        self.with_markup(query, encode_page(&results))
    }

    /// Queues raw markup for `query`.
    #[must_use]
    pub fn with_markup(self, query: &str, markup: impl Into<String>) -> Self {
        self.push(query, Ok(markup.into()));
        self
    }

    /// Queues a failure for `query`.
    #[must_use]
    pub fn with_error(self, query: &str, error: FetchError) -> Self {
        self.push(query, Err(error));
        self
    }

    /// Sleeps for `delay` before every response.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(&self, query: &str, response: Result<String, FetchError>) {
        self.scripts
            .lock()
            .entry(query.to_string())
            .or_default()
            .push_back(response);
    }

    /// Returns the number of fetches made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the parameters of every fetch, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<RequestParams> {
        self.requests.lock().clone()
    }

    /// Returns the parameters of fetches made for `query`.
    #[must_use]
    pub fn requests_for(&self, query: &str) -> Vec<RequestParams> {
        self.requests
            .lock()
            .iter()
            .filter(|p| p.get("q").and_then(Option::as_deref) == Some(query))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, _base_url: &str, params: &RequestParams) -> Result<String, FetchError> {
        self.requests.lock().push(params.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let query = params.get("q").cloned().flatten().unwrap_or_default();
        let next = self
            .scripts
            .lock()
            .get_mut(&query)
            .and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| Ok(String::new()))
    }
}

/// Decodes markup produced by [`encode_page`]. Anything else extracts to
/// nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageExtractor;

impl Extractor for PageExtractor {
    fn extract(&self, markup: &str) -> Vec<RawResult> {
        let results: Vec<RawResult> = serde_json::from_str(markup).unwrap_or_default();
        dedup_by_url(results)
    }
}
