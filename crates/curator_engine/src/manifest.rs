use std::fs;
use std::path::{Path, PathBuf};

use curator_logging::{curator_debug, curator_info, curator_warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("resource manifest not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read resource manifest: {0}")]
    Io(#[from] std::io::Error),
}

/// One entry of the input manifest. Fields other than `url` are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceRecord {
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceRecord {
    /// Identity key: trimmed, lower-cased URL.
    pub fn normalized_url(&self) -> String {
        self.url.trim().to_ascii_lowercase()
    }
}

/// Ingestion counters, snapshotted per load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub duplicates: usize,
    /// Manifest fragments the recovery parser could not reconstruct.
    pub unrecovered_fragments: usize,
}

/// Loads, validates and deduplicates resource manifests.
///
/// Manifests are hand-edited and frequently contain several concatenated
/// JSON arrays instead of one document; loading therefore degrades from a
/// strict parse to per-fragment recovery rather than failing the run.
#[derive(Debug, Default)]
pub struct ResourceLoader {
    stats: LoadStats,
}

impl ResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load raw entries from a manifest file.
    ///
    /// Only a missing or unreadable file is an error; malformed content
    /// degrades to "fewer entries recovered".
    pub fn load(&mut self, path: &Path) -> Result<Vec<Value>, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }

        curator_info!("Loading resources from: {}", path.display());
        let content = fs::read_to_string(path)?;

        let entries = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(items)) => items,
            Ok(value @ Value::Object(_)) => vec![value],
            _ => {
                curator_warn!("Strict manifest parse failed, attempting fragment recovery");
                self.recover_fragments(&content)
            }
        };

        self.stats.total = entries.len();
        curator_info!("Loaded {} resources", self.stats.total);
        Ok(entries)
    }

    /// Best-effort parse of a manifest holding multiple concatenated arrays.
    ///
    /// The text is split on each closing-array delimiter, every fragment is
    /// re-bracketed into a syntactically valid array and parsed on its own.
    /// Fragments that still fail are dropped and counted, never raised.
    fn recover_fragments(&mut self, content: &str) -> Vec<Value> {
        let mut entries = Vec::new();

        for part in content.split(']') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let mut fragment = String::with_capacity(part.len() + 2);
            if !part.starts_with('[') {
                fragment.push('[');
            }
            fragment.push_str(part);
            fragment.push(']');

            match serde_json::from_str::<Value>(&fragment) {
                Ok(Value::Array(items)) => entries.extend(items),
                Ok(value @ Value::Object(_)) => entries.push(value),
                _ => {
                    // Last resort: the fragment may be a bare object.
                    let bare = part.trim_matches(&['[', ']'][..]).trim();
                    match serde_json::from_str::<Value>(bare) {
                        Ok(value @ Value::Object(_)) => entries.push(value),
                        _ => {
                            self.stats.unrecovered_fragments += 1;
                            curator_debug!("Dropped unrecoverable manifest fragment");
                        }
                    }
                }
            }
        }

        entries
    }

    /// Keep entries with a usable URL; drop and count the rest.
    pub fn validate(&mut self, entries: Vec<Value>) -> Vec<ResourceRecord> {
        let mut valid = Vec::with_capacity(entries.len());

        for entry in entries {
            match validate_entry(&entry) {
                Some(record) => {
                    valid.push(record);
                    self.stats.valid += 1;
                }
                None => {
                    curator_warn!("Dropping invalid resource entry: {entry}");
                    self.stats.invalid += 1;
                }
            }
        }

        curator_info!(
            "Validation: {} valid, {} invalid",
            self.stats.valid,
            self.stats.invalid
        );
        valid
    }

    /// Remove duplicate records keyed on the normalized URL. First
    /// occurrence wins; order is preserved.
    pub fn deduplicate(&mut self, records: Vec<ResourceRecord>) -> Vec<ResourceRecord> {
        let mut seen = std::collections::HashSet::new();
        let mut unique = Vec::with_capacity(records.len());

        for record in records {
            if seen.insert(record.normalized_url()) {
                unique.push(record);
            } else {
                self.stats.duplicates += 1;
                curator_debug!("Duplicate URL found: {}", record.normalized_url());
            }
        }

        if self.stats.duplicates > 0 {
            curator_info!("Removed {} duplicate resources", self.stats.duplicates);
        }
        unique
    }

    /// Run load, validate and deduplicate in order; returns the final
    /// sequence and a stats snapshot.
    pub fn load_and_validate(
        &mut self,
        path: &Path,
    ) -> Result<(Vec<ResourceRecord>, LoadStats), ManifestError> {
        let entries = self.load(path)?;
        let valid = self.validate(entries);
        let unique = self.deduplicate(valid);

        curator_info!("Final resource count: {}", unique.len());
        Ok((unique, self.stats))
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }
}

fn validate_entry(entry: &Value) -> Option<ResourceRecord> {
    let url = entry.get("url")?.as_str()?.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return None;
    }
    serde_json::from_value(entry.clone()).ok()
}
