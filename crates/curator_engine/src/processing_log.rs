use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use curator_logging::curator_warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Completed,
    Failed,
}

/// One attempted save or contained failure. Entries are append-only; the
/// log is only ever extended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
    pub url: String,
    pub status: ProcessingStatus,
    pub processed_at: DateTime<Utc>,
    pub output_file: Option<PathBuf>,
    pub error: Option<String>,
}

/// Durable audit log of every processed resource.
///
/// The aggregate counts are recomputed from the entry sequence on every
/// append instead of being tracked incrementally, so they cannot drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingLog {
    pub last_updated: DateTime<Utc>,
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub resources: Vec<ProcessingLogEntry>,
}

impl ProcessingLog {
    pub fn new() -> Self {
        Self {
            last_updated: Utc::now(),
            total_processed: 0,
            successful: 0,
            failed: 0,
            resources: Vec::new(),
        }
    }

    /// Load a log from disk. A missing or corrupt file yields a fresh log;
    /// prior history is only lost if the file itself is gone.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Self::new();
            }
            Err(err) => {
                curator_warn!("Failed to read processing log {}: {err}", path.display());
                return Self::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(log) => log,
            Err(err) => {
                curator_warn!("Failed to parse processing log {}: {err}", path.display());
                Self::new()
            }
        }
    }

    /// Append one entry and recompute the aggregates from the sequence.
    pub fn append(&mut self, entry: ProcessingLogEntry) {
        self.resources.push(entry);
        self.total_processed = self.resources.len();
        self.successful = self
            .resources
            .iter()
            .filter(|entry| entry.status == ProcessingStatus::Completed)
            .count();
        self.failed = self
            .resources
            .iter()
            .filter(|entry| entry.status == ProcessingStatus::Failed)
            .count();
        self.last_updated = Utc::now();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for ProcessingLog {
    fn default() -> Self {
        Self::new()
    }
}
