//! The per-query page loop.
//!
//! [`QueryAggregator`] issues successive page requests for one keyword,
//! assigns absolute positions, de-duplicates by URL across every page of
//! the query and stops according to [`Termination`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::failure_tolerance::QueryFailure;
use super::sequencer::PageSequencer;
use crate::core::{
    PageOutcome, PageProgress, PositionedResult, Query, QueryResult, Termination, MAX_PAGE_SIZE,
};
use crate::errors::SerpError;
use crate::events::{EventSink, NoOpEventSink, RunEvent, RunEventKind};
use crate::serp::{Extractor, Fetcher, SerpSettings};

/// Page size used for the continuation reported on a completed query.
pub const CONTINUATION_PAGE_SIZE: usize = 10;

/// Produces one [`QueryResult`] per [`Query`].
///
/// The fetcher and extractor are shared; all loop state (collected
/// results, seen URLs, offsets) is local to each [`run`](Self::run) call,
/// so one aggregator can serve many queries at once.
pub struct QueryAggregator {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    base_url: String,
    query_timeout: Option<Duration>,
    events: Arc<dyn EventSink>,
}

impl fmt::Debug for QueryAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryAggregator")
            .field("base_url", &self.base_url)
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

impl QueryAggregator {
    /// Creates an aggregator against the default search endpoint.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            fetcher,
            extractor,
            base_url: SerpSettings::default().base_url,
            query_timeout: None,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Creates an aggregator using the endpoint and deadline from settings.
    #[must_use]
    pub fn from_settings(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        settings: &SerpSettings,
    ) -> Self {
        let mut aggregator = Self::new(fetcher, extractor).with_base_url(&settings.base_url);
        aggregator.query_timeout = settings.query_timeout();
        aggregator
    }

    /// Sets the search endpoint.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets a deadline for each query.
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// The search endpoint.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The per-query deadline, if any.
    #[must_use]
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    /// Runs the page loop for `query`.
    ///
    /// A fetch failure or an expired deadline ends the query; the
    /// [`QueryFailure`] carries whatever was collected so the caller can
    /// apply its partial result policy.
    pub async fn run(&self, query: &Query) -> Result<QueryResult, QueryFailure> {
        let options = &query.options;
        let deadline = self
            .query_timeout
            .and_then(|t| Instant::now().checked_add(t));

        self.events
            .emit(RunEvent::new(
                RunEventKind::QueryStarted,
                json!({
                    "query": query.text,
                    "start": options.start,
                    "limit": options.limit,
                    "pages": options.pages,
                }),
            ))
            .await;

        let mut collected: Vec<PositionedResult> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut current_start = options.start;
        let mut remaining = options.limit;
        let mut page_count = 0;
        let mut termination = if remaining == 0 {
            Termination::LimitReached
        } else if options.pages == 0 {
            Termination::PageCapReached
        } else {
            Termination::Fetching
        };

        while !termination.is_terminal() {
            let page_size = remaining.min(MAX_PAGE_SIZE);
            debug!(query = %query.text, start = current_start, page_size, "Requesting page");

            let page = match self.fetch_page(query, current_start, page_size, deadline).await {
                Ok(page) => page,
                Err(error) => return Err(self.fail(query, error, collected).await),
            };
            let fetched = page.fetched();

            self.events
                .emit(RunEvent::new(
                    RunEventKind::PageFetched,
                    json!({
                        "query": query.text,
                        "start": current_start,
                        "page_size": page_size,
                        "fetched": fetched,
                    }),
                ))
                .await;

            if fetched == 0 {
                termination = Termination::after_empty_page();
                break;
            }

            for raw in page.results {
                if seen.insert(raw.url.clone()) {
                    let position = collected.len() + 1;
                    collected.push(raw.at_position(position));
                }
            }

            remaining = remaining.saturating_sub(fetched);
            page_count += 1;

            termination = Termination::after_page(&PageProgress {
                page_size,
                fetched,
                remaining,
                page_count,
                max_pages: options.pages,
                has_next_start: page.next_start.is_some(),
            });

            if !termination.is_terminal() {
                if let Some(next_start) = page.next_start {
                    current_start = next_start;
                }
            }
        }

        collected.truncate(options.limit);
        let next = PageSequencer::next_page(current_start, CONTINUATION_PAGE_SIZE, 0);

        info!(
            query = %query.text,
            results = collected.len(),
            pages = page_count,
            termination = %termination,
            "Query completed"
        );
        self.events
            .emit(RunEvent::new(
                RunEventKind::QueryCompleted,
                json!({
                    "query": query.text,
                    "results": collected.len(),
                    "pages": page_count,
                    "termination": termination.to_string(),
                }),
            ))
            .await;

        Ok(QueryResult::completed(
            query.text.clone(),
            collected,
            next.into_pair(),
            termination,
        ))
    }

    /// Fetches and extracts one page, truncated to `page_size`.
    async fn fetch_page(
        &self,
        query: &Query,
        start: usize,
        page_size: usize,
        deadline: Option<Instant>,
    ) -> Result<PageOutcome, SerpError> {
        let params = query.page_request(start, page_size).to_params();
        let fetch = self.fetcher.fetch(&self.base_url, &params);

        let markup = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fetch)
                .await
                .map_err(|_| self.timeout_error(query))??,
            None => fetch.await?,
        };

        let mut results = self.extractor.extract(&markup);
        results.truncate(page_size);

        let next = PageSequencer::next_page(start, page_size, results.len());
        Ok(PageOutcome {
            results,
            next_page: next.next_page,
            next_start: next.next_start,
        })
    }

    fn timeout_error(&self, query: &Query) -> SerpError {
        SerpError::Timeout {
            query: query.text.clone(),
            seconds: self.query_timeout.unwrap_or_default().as_secs_f64(),
        }
    }

    async fn fail(
        &self,
        query: &Query,
        error: SerpError,
        collected: Vec<PositionedResult>,
    ) -> QueryFailure {
        warn!(
            query = %query.text,
            collected = collected.len(),
            error = %error,
            "Query failed"
        );
        self.events
            .emit(RunEvent::new(
                RunEventKind::QueryFailed,
                json!({
                    "query": query.text,
                    "error": error.to_string(),
                    "kind": error.kind(),
                    "query_scoped": error.is_query_scoped(),
                    "collected": collected.len(),
                }),
            ))
            .await;

        QueryFailure::new(query.text.clone(), error).with_partial(collected)
    }
}
