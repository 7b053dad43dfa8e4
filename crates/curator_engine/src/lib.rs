//! Curator engine: manifest ingestion, classification, extraction and
//! storage pipeline.
mod classify;
mod extract;
mod fetch;
mod manifest;
mod persist;
mod pipeline;
mod processing_log;
mod registry;
mod storage;
mod types;

pub use classify::TypeClassifier;
pub use extract::{ContentExtractor, FallbackExtractor, FALLBACK_EXTRACTOR_ID};
pub use fetch::{FetchMetadata, FetchOutput, FetchSettings, Fetcher, HttpFetcher};
pub use manifest::{LoadStats, ManifestError, ResourceLoader, ResourceRecord};
pub use persist::{ensure_output_dir, StorageError};
pub use pipeline::Pipeline;
pub use processing_log::{ProcessingLog, ProcessingLogEntry, ProcessingStatus};
pub use registry::ExtractorRegistry;
pub use storage::{StorageManager, StorageStats, PROCESSING_LOG_FILENAME};
pub use types::{
    ContentMetadata, ExtractError, ExtractedContent, FetchError, FetchFailureKind, ResourceType,
    RunStatistics, TypeMetadata,
};
