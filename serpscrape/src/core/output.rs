//! Output sinks for the batch document.

use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

use super::RunOutput;
use crate::errors::Result;

/// Destination for a finished [`RunOutput`].
pub trait OutputSink: Send + Sync {
    /// Writes the whole document.
    fn write(&self, output: &RunOutput) -> Result<()>;

    /// Human-readable description of the destination.
    fn describe(&self) -> String;
}

/// Writes the document as indented JSON to a file, creating parent
/// directories as needed.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Creates a sink for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for JsonFileSink {
    fn write(&self, output: &RunOutput) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = output.to_json_pretty()?;
        fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), blocks = output.len(), "Wrote run output");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the last written document in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    last: Mutex<Option<RunOutput>>,
}

impl MemorySink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently written document.
    #[must_use]
    pub fn last(&self) -> Option<RunOutput> {
        self.last.lock().clone()
    }
}

impl OutputSink for MemorySink {
    fn write(&self, output: &RunOutput) -> Result<()> {
        *self.last.lock() = Some(output.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{QueryResult, RawResult, Termination};

    fn sample_output() -> RunOutput {
        vec![
            QueryResult::completed(
                "nike shoes",
                vec![RawResult::new("Nike", "https://www.nike.com/", "").at_position(1)],
                (None, None),
                Termination::ShortPage,
            ),
            QueryResult::failed("adidas", "Failed to fetch SERP after 3 attempts: timeout"),
        ]
        .into()
    }

    #[test]
    fn test_json_file_sink_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("out.json");
        let sink = JsonFileSink::new(&path);

        sink.write(&sample_output()).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let blocks = written.as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["results"][0]["position"], 1);
        assert_eq!(blocks[1]["error"], "Failed to fetch SERP after 3 attempts: timeout");
        assert!(blocks[0].get("error").is_none());
    }

    #[test]
    fn test_json_file_sink_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("out.json"));
        let output = sample_output();

        sink.write(&output).unwrap();
        let read: RunOutput =
            serde_json::from_str(&fs::read_to_string(sink.path()).unwrap()).unwrap();

        assert_eq!(read.len(), output.len());
        assert_eq!(read.iter().next().unwrap().results, output.iter().next().unwrap().results);
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        assert!(sink.last().is_none());
        sink.write(&sample_output()).unwrap();
        assert_eq!(sink.last().unwrap().failed_count(), 1);
        assert_eq!(sink.describe(), "memory");
    }
}
