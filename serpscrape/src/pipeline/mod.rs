//! The aggregation engine.
//!
//! This module provides:
//! - Page offset sequencing
//! - The per-query page loop with positions, de-duplication and stop rules
//! - Batch execution with per-query failure isolation
//! - The partial result policy for failed queries

mod aggregator;
mod batch;
mod failure_tolerance;
mod sequencer;


pub use aggregator::{QueryAggregator, CONTINUATION_PAGE_SIZE};
pub use batch::{load_keywords, BatchRunner};
pub use failure_tolerance::{PartialResultPolicy, QueryFailure};
pub use sequencer::{Continuation, PageSequencer};
