use std::path::Path;

use chrono::Utc;
use curator_logging::{curator_error, curator_info, curator_warn};

use crate::classify::TypeClassifier;
use crate::manifest::{LoadStats, ManifestError, ResourceLoader, ResourceRecord};
use crate::registry::ExtractorRegistry;
use crate::storage::StorageManager;
use crate::types::RunStatistics;

/// Drives the full ingest → classify → extract → store pipeline.
///
/// Resources are processed strictly one at a time, in input order. Any
/// failure at classification, extraction or storage is contained to the
/// affected resource; only a missing or unreadable manifest aborts the run.
pub struct Pipeline {
    loader: ResourceLoader,
    classifier: TypeClassifier,
    registry: ExtractorRegistry,
    storage: StorageManager,
}

impl Pipeline {
    pub fn new(registry: ExtractorRegistry, storage: StorageManager) -> Self {
        Self {
            loader: ResourceLoader::new(),
            classifier: TypeClassifier::new(),
            registry,
            storage,
        }
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// Ingestion stats snapshot for the last run.
    pub fn load_stats(&self) -> LoadStats {
        self.loader.stats()
    }

    pub fn classifier(&self) -> &TypeClassifier {
        &self.classifier
    }

    /// Process every resource in the manifest and return the run counters.
    pub async fn run(&mut self, manifest_path: &Path) -> Result<RunStatistics, ManifestError> {
        let mut stats = RunStatistics::start();

        let (records, load_stats) = self.loader.load_and_validate(manifest_path)?;
        stats.total = records.len();

        if records.is_empty() {
            curator_warn!("No valid resources found to process");
            stats.finished_at = Some(Utc::now());
            return Ok(stats);
        }

        curator_info!(
            "Loaded {} resources (valid: {}, invalid: {}, duplicates: {})",
            load_stats.total,
            load_stats.valid,
            load_stats.invalid,
            load_stats.duplicates
        );
        if load_stats.unrecovered_fragments > 0 {
            curator_warn!(
                "{} manifest fragments could not be recovered",
                load_stats.unrecovered_fragments
            );
        }

        curator_info!("Processing {} resources", records.len());
        let total = records.len();
        for (idx, record) in records.iter().enumerate() {
            if self.process_resource(record, idx + 1, total).await {
                stats.successful += 1;
            } else {
                stats.failed += 1;
            }
        }

        stats.finished_at = Some(Utc::now());
        self.log_summary(&stats);

        if let Err(err) = self.storage.flush_log() {
            curator_error!("Failed to save processing log: {err}");
        }

        Ok(stats)
    }

    /// Process one resource; a `false` return means the failure was
    /// recorded and the batch should continue.
    async fn process_resource(
        &mut self,
        record: &ResourceRecord,
        index: usize,
        total: usize,
    ) -> bool {
        let url = record.url.trim();
        curator_info!("[{index}/{total}] {url}");

        let (resource_type, metadata) = self.classifier.classify(url);
        curator_info!("  type: {resource_type}");

        let extractor = self.registry.select(resource_type);
        match extractor.extract(url, &metadata).await {
            Ok(content) => self.storage.save(&content, resource_type, url).is_some(),
            Err(err) => {
                curator_error!("  extraction failed: {err}");
                self.storage.record_failure(url, &err.to_string());
                false
            }
        }
    }

    fn log_summary(&self, stats: &RunStatistics) {
        let elapsed = stats.elapsed();

        curator_info!("{}", "=".repeat(60));
        curator_info!("Successfully processed: {}", stats.successful);
        curator_info!("Failed: {}", stats.failed);
        curator_info!("Time elapsed: {}s", elapsed.num_seconds());
        curator_info!("Output directory: {}", self.storage.base_path().display());
        curator_info!("Processing log: {}", self.storage.log_path().display());

        curator_info!("Detection statistics:");
        for (resource_type, count) in self.classifier.stats() {
            if count > 0 {
                curator_info!("  {resource_type}: {count}");
            }
        }

        let storage_stats = self.storage.stats();
        curator_info!(
            "Storage: {} files saved, {} bytes",
            storage_stats.saved,
            storage_stats.total_bytes
        );
    }
}
