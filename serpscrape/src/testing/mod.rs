//! Testing utilities for code built on the aggregation engine.
//!
//! This module provides:
//! - A scripted fetcher that replays pages and failures per keyword
//! - Extractors that return canned results
//! - Fixture builders for result lists and result page markup

pub mod fixtures;
mod mocks;

pub use fixtures::{raw_results, serp_html, NIKE_SERP_HTML};
pub use mocks::{encode_page, PageExtractor, ScriptedFetcher};
