//! Organic-result extraction from search result markup, backed by `scraper`.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::protocols::{dedup_by_url, Extractor};
use crate::core::RawResult;

/// CSS selectors used to locate result blocks and their fields.
///
/// Within each list the first selector that matches wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Result blocks.
    #[serde(default = "default_block_selectors")]
    pub block_selectors: Vec<String>,
    /// Result blocks, tried only when no primary block matched.
    #[serde(default = "default_fallback_block_selectors")]
    pub fallback_block_selectors: Vec<String>,
    /// Anchor carrying the result URL.
    #[serde(default = "default_link_selectors")]
    pub link_selectors: Vec<String>,
    /// Title element.
    #[serde(default = "default_title_selectors")]
    pub title_selectors: Vec<String>,
    /// Snippet element.
    #[serde(default = "default_description_selectors")]
    pub description_selectors: Vec<String>,
}

fn default_block_selectors() -> Vec<String> {
    vec!["div#search div.g, div#search div[data-header-feature='0']".to_string()]
}

fn default_fallback_block_selectors() -> Vec<String> {
    vec!["div#search .MjjYud".to_string()]
}

fn default_link_selectors() -> Vec<String> {
    vec![".yuRUbf > a".to_string(), "a".to_string()]
}

fn default_title_selectors() -> Vec<String> {
    vec!["h3".to_string()]
}

fn default_description_selectors() -> Vec<String> {
    vec!["div.VwiC3b".to_string(), "div.IsZvec".to_string()]
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            block_selectors: default_block_selectors(),
            fallback_block_selectors: default_fallback_block_selectors(),
            link_selectors: default_link_selectors(),
            title_selectors: default_title_selectors(),
            description_selectors: default_description_selectors(),
        }
    }
}

/// Extracts organic results from a search result page.
#[derive(Debug, Clone)]
pub struct SerpExtractor {
    blocks: Vec<Selector>,
    fallback_blocks: Vec<Selector>,
    links: Vec<Selector>,
    titles: Vec<Selector>,
    descriptions: Vec<Selector>,
}

impl Default for SerpExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl SerpExtractor {
    /// Builds an extractor. Selectors that fail to parse are skipped.
    #[must_use]
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            blocks: parse_all(&config.block_selectors),
            fallback_blocks: parse_all(&config.fallback_block_selectors),
            links: parse_all(&config.link_selectors),
            titles: parse_all(&config.title_selectors),
            descriptions: parse_all(&config.description_selectors),
        }
    }

    fn candidates<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let primary = select_all(document, &self.blocks);
        if primary.is_empty() {
            select_all(document, &self.fallback_blocks)
        } else {
            primary
        }
    }

    fn parse_block(&self, node: ElementRef<'_>) -> Option<RawResult> {
        let anchor = self.links.iter().find_map(|s| node.select(s).next());
        let url = anchor.and_then(|a| a.value().attr("href"))?;

        let title = self
            .titles
            .iter()
            .find_map(|s| node.select(s).next())
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| {
                anchor
                    .map(|a| a.text().collect::<String>().trim().to_string())
                    .filter(|t| !t.is_empty())
            })?;

        let description = self
            .descriptions
            .iter()
            .find_map(|s| node.select(s).next())
            .map(joined_text)
            .unwrap_or_default();

        Some(RawResult::new(title, url, description))
    }
}

impl Extractor for SerpExtractor {
    fn extract(&self, markup: &str) -> Vec<RawResult> {
        let document = Html::parse_document(markup);
        let results = self
            .candidates(&document)
            .into_iter()
            .filter_map(|node| self.parse_block(node))
            .collect();
        dedup_by_url(results)
    }
}

fn parse_all(selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(selector = %s, error = %e, "Skipping invalid selector");
                None
            }
        })
        .collect()
}

fn select_all<'a>(document: &'a Html, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    selectors
        .iter()
        .map(|s| document.select(s).collect::<Vec<_>>())
        .find(|matches| !matches.is_empty())
        .unwrap_or_default()
}

/// Text nodes trimmed, blanks dropped, joined by single spaces.
fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
