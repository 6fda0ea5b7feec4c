//! Batch execution over a keyword list.

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde_json::json;
use std::any::Any;
use std::fmt;
use std::fs;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use super::aggregator::QueryAggregator;
use super::failure_tolerance::PartialResultPolicy;
use crate::core::{OutputSink, Query, QueryOptions, QueryResult, RunOutput};
use crate::errors::Result;
use crate::events::{EventSink, NoOpEventSink, RunEvent, RunEventKind};
use crate::serp::{Extractor, Fetcher, SerpSettings};

/// Reads keywords, one per line. Lines are trimmed and blank lines skipped.
pub fn load_keywords(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

/// Runs every keyword through a [`QueryAggregator`] and assembles the
/// output in input order.
///
/// A failing query never stops the batch: its slot is filled according to
/// the [`PartialResultPolicy`].
pub struct BatchRunner {
    aggregator: QueryAggregator,
    policy: PartialResultPolicy,
    max_concurrent: usize,
    events: Arc<dyn EventSink>,
}

impl fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRunner")
            .field("aggregator", &self.aggregator)
            .field("policy", &self.policy)
            .field("max_concurrent", &self.max_concurrent)
            .finish_non_exhaustive()
    }
}

impl BatchRunner {
    /// Creates a sequential runner that discards partial results.
    #[must_use]
    pub fn new(aggregator: QueryAggregator) -> Self {
        Self {
            aggregator,
            policy: PartialResultPolicy::default(),
            max_concurrent: 1,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Creates a runner configured from settings.
    #[must_use]
    pub fn from_settings(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        settings: &SerpSettings,
    ) -> Self {
        Self::new(QueryAggregator::from_settings(fetcher, extractor, settings))
            .with_policy(settings.partial_results)
            .with_max_concurrent(settings.max_concurrent_queries)
    }

    /// Sets the partial result policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PartialResultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how many queries may run at once. Zero is treated as one.
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Sets the event sink for the runner and its aggregator.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.aggregator = self.aggregator.with_event_sink(events.clone());
        self.events = events;
        self
    }

    /// The partial result policy.
    #[must_use]
    pub fn policy(&self) -> PartialResultPolicy {
        self.policy
    }

    /// Maximum number of queries in flight.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Runs every keyword with the same options.
    ///
    /// The output has exactly one block per keyword, in keyword order.
    pub async fn run(&self, keywords: &[String], options: &QueryOptions) -> RunOutput {
        let run_id = Uuid::new_v4();
        let span = info_span!("batch", run_id = %run_id, queries = keywords.len());

        async {
            let results: Vec<QueryResult> = stream::iter(keywords)
                .map(|keyword| self.run_query(Query::new(keyword.as_str(), options.clone())))
                .buffered(self.max_concurrent)
                .collect()
                .await;
            let output = RunOutput::from(results);

            info!(
                queries = output.len(),
                failed = output.failed_count(),
                results = output.result_count(),
                "Batch completed"
            );
            self.events
                .emit(RunEvent::new(
                    RunEventKind::BatchCompleted,
                    json!({
                        "run_id": run_id.to_string(),
                        "queries": output.len(),
                        "failed": output.failed_count(),
                        "results": output.result_count(),
                    }),
                ))
                .await;

            output
        }
        .instrument(span)
        .await
    }

    /// Runs the batch and writes the output to `sink`.
    pub async fn run_to_sink(
        &self,
        keywords: &[String],
        options: &QueryOptions,
        sink: &dyn OutputSink,
    ) -> Result<RunOutput> {
        let output = self.run(keywords, options).await;
        sink.write(&output)?;
        info!(destination = %sink.describe(), blocks = output.len(), "Output written");
        Ok(output)
    }

    async fn run_query(&self, query: Query) -> QueryResult {
        match AssertUnwindSafe(self.aggregator.run(&query))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(failure)) => self.policy.resolve(failure),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(query = %query.text, panic = %message, "Query panicked");
                QueryResult::failed(query.text, format!("query panicked: {message}"))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RunParams;
    use crate::testing::{PageExtractor, ScriptedFetcher};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_keywords_trims_and_skips_blanks() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  nike shoes  \n\n\t\nadidas\r\nbest running shoes 2024").unwrap();

        let keywords = load_keywords(file.path()).unwrap();
        assert_eq!(keywords, vec!["nike shoes", "adidas", "best running shoes 2024"]);
    }

    #[test]
    fn test_load_keywords_missing_file() {
        let err = load_keywords("/definitely/not/here.txt").unwrap_err();
        assert_eq!(err.kind(), "IoError");
    }

    #[test]
    fn test_from_settings() {
        let settings = SerpSettings::default()
            .with_max_concurrent(0)
            .with_partial_results(PartialResultPolicy::Keep);
        let runner = BatchRunner::from_settings(
            Arc::new(ScriptedFetcher::new()),
            Arc::new(PageExtractor),
            &settings,
        );

        assert_eq!(runner.max_concurrent(), 1);
        assert_eq!(runner.policy(), PartialResultPolicy::Keep);
    }

    #[test]
    fn test_empty_batch() {
        let runner = BatchRunner::new(QueryAggregator::new(
            Arc::new(ScriptedFetcher::new()),
            Arc::new(PageExtractor),
        ));
        let options = RunParams::default().validate().unwrap();

        let output = tokio_test::block_on(runner.run(&[], &options));
        assert!(output.is_empty());
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
