//! # Serpscrape
//!
//! Keyword search result scraping with multi-page aggregation.
//!
//! Serpscrape fetches search result pages for a list of keywords and turns
//! them into ranked, de-duplicated result records:
//!
//! - **Page sequencing**: offsets and page numbers for successive pages
//! - **Aggregation**: a per-query page loop that assigns absolute positions,
//!   de-duplicates by URL across pages and stops on short or empty pages,
//!   the result limit or the page cap
//! - **Batch execution**: per-query failure isolation, input-ordered output
//!   and optional bounded concurrency
//! - **Pluggable capabilities**: [`serp::Fetcher`] and [`serp::Extractor`]
//!   traits with an HTTP fetcher and a selector-based extractor behind the
//!   `http` feature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serpscrape::prelude::*;
//! use std::sync::Arc;
//!
//! let settings = SerpSettings::default();
//! let runner = BatchRunner::from_settings(
//!     Arc::new(HttpFetcher::new(&settings)?),
//!     Arc::new(SerpExtractor::default()),
//!     &settings,
//! );
//!
//! let options = RunParams::new().with_limit(20).with_pages(2).validate()?;
//! let keywords = load_keywords("data/input_keywords.txt")?;
//! let output = runner
//!     .run_to_sink(&keywords, &options, &JsonFileSink::new("out.json"))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod serp;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        JsonFileSink, MemorySink, OutputSink, PositionedResult, Query, QueryOptions,
        QueryResult, RawResult, RunOutput, RunParams, Termination,
    };
    pub use crate::errors::{ConfigError, FetchError, Result, SerpError, ValidationError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{
        load_keywords, BatchRunner, PageSequencer, PartialResultPolicy, QueryAggregator,
    };
    #[cfg(feature = "http")]
    pub use crate::serp::{HttpFetcher, SerpExtractor};
    pub use crate::serp::{load_settings, Extractor, Fetcher, SerpSettings};
}
