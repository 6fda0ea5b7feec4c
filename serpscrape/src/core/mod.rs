//! Core domain model types for serpscrape.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Queries, run options and page requests
//! - Raw and positioned result records, per-query and per-run output
//! - The termination state machine of the page loop
//! - Output sinks

mod output;
mod query;
mod result;
mod status;

pub use output::{JsonFileSink, MemorySink, OutputSink};
pub use query::{
    PageRequest, Query, QueryOptions, RequestParams, RunParams, MAX_PAGE_SIZE,
};
pub use result::{PageOutcome, PositionedResult, QueryResult, RawResult, RunOutput};
pub use status::{PageProgress, Termination};
