//! Fetching and extraction of search result pages.
//!
//! This module provides:
//! - Protocol traits for the fetch and extract capabilities
//! - Settings for fetching, retries and batch execution
//! - An HTTP fetcher with rotated client identity (`http` feature)
//! - A selector-based organic result extractor (`http` feature)

mod config;
#[cfg(feature = "http")]
mod extractor;
#[cfg(feature = "http")]
mod fetcher;
mod protocols;

pub use config::{
    load_settings, RetryPolicy, SerpSettings, DEFAULT_USER_AGENTS, MAX_DURATION_SECONDS,
};
#[cfg(feature = "http")]
pub use extractor::{ExtractorConfig, SerpExtractor};
#[cfg(feature = "http")]
pub use fetcher::HttpFetcher;
pub use protocols::{dedup_by_url, Extractor, Fetcher};
