//! Run lifecycle events.
//!
//! The aggregation engine reports progress through an [`EventSink`]:
//! one event when a query starts, one per fetched page, one when a query
//! completes or fails, and one when the batch is done.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::iso_timestamp;

/// Kinds of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunEventKind {
    /// A query's page loop is starting.
    #[serde(rename = "query.started")]
    QueryStarted,
    /// One page was fetched and extracted.
    #[serde(rename = "page.fetched")]
    PageFetched,
    /// A query finished without error.
    #[serde(rename = "query.completed")]
    QueryCompleted,
    /// A query failed.
    #[serde(rename = "query.failed")]
    QueryFailed,
    /// Every query of the batch has been processed.
    #[serde(rename = "batch.completed")]
    BatchCompleted,
}

impl RunEventKind {
    /// Dotted event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryStarted => "query.started",
            Self::PageFetched => "page.fetched",
            Self::QueryCompleted => "query.completed",
            Self::QueryFailed => "query.failed",
            Self::BatchCompleted => "batch.completed",
        }
    }
}

impl fmt::Display for RunEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped lifecycle event with a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    /// What happened.
    #[serde(rename = "type")]
    pub kind: RunEventKind,
    /// ISO-8601 UTC timestamp.
    pub timestamp: String,
    /// Event payload.
    pub data: serde_json::Value,
}

impl RunEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(kind: RunEventKind, data: serde_json::Value) -> Self {
        Self {
            kind,
            timestamp: iso_timestamp(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(RunEventKind::QueryStarted.to_string(), "query.started");
        assert_eq!(RunEventKind::BatchCompleted.as_str(), "batch.completed");
        assert_eq!(
            serde_json::to_value(RunEventKind::PageFetched).unwrap(),
            serde_json::json!("page.fetched")
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = RunEvent::new(RunEventKind::QueryFailed, serde_json::json!({"query": "q"}));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "query.failed");
        assert_eq!(value["data"]["query"], "q");
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }
}
