use std::path::{Path, PathBuf};

use curator_logging::{curator_error, curator_info};
use chrono::Utc;

use crate::persist::{ensure_output_dir, write_new, write_replace, StorageError};
use crate::processing_log::{ProcessingLog, ProcessingLogEntry, ProcessingStatus};
use crate::types::{ExtractedContent, ResourceType};

pub const PROCESSING_LOG_FILENAME: &str = "_processing-log.json";

const SLUG_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub saved: usize,
    pub failed: usize,
    pub total_bytes: u64,
}

/// Writes extracted content as categorized markdown documents and keeps the
/// append-only processing log for the run.
///
/// Documents are addressed by `(category, filename)`; filenames within a
/// category are unique, with collisions resolved by suffixing a counter,
/// never by overwrite. The log accumulates in memory and is flushed once at
/// the end of a run.
pub struct StorageManager {
    base_path: PathBuf,
    log: ProcessingLog,
    stats: StorageStats,
}

impl StorageManager {
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        ensure_output_dir(&base_path)?;
        let log = ProcessingLog::load(&base_path.join(PROCESSING_LOG_FILENAME));

        Ok(Self {
            base_path,
            log,
            stats: StorageStats::default(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn log_path(&self) -> PathBuf {
        self.base_path.join(PROCESSING_LOG_FILENAME)
    }

    /// Save extracted content as a document in its category directory.
    ///
    /// Never fails the caller: an I/O problem is logged, counted and
    /// recorded as a failed log entry, and `None` is returned. Every call
    /// appends exactly one log entry.
    pub fn save(
        &mut self,
        content: &ExtractedContent,
        resource_type: ResourceType,
        original_url: &str,
    ) -> Option<PathBuf> {
        match self.try_save(content, resource_type) {
            Ok((path, bytes)) => {
                self.stats.saved += 1;
                self.stats.total_bytes += bytes as u64;
                self.append_entry(original_url, ProcessingStatus::Completed, Some(&path), None);
                curator_info!("Saved to: {}", path.display());
                Some(path)
            }
            Err(err) => {
                curator_error!("Failed to save content for {original_url}: {err}");
                self.stats.failed += 1;
                self.append_entry(
                    original_url,
                    ProcessingStatus::Failed,
                    None,
                    Some(&err.to_string()),
                );
                None
            }
        }
    }

    /// Record a failure contained upstream (classification or extraction)
    /// as a failed log entry.
    pub fn record_failure(&mut self, url: &str, error: &str) {
        self.append_entry(url, ProcessingStatus::Failed, None, Some(error));
    }

    /// Flush the in-memory log to durable storage. Called once per run.
    pub fn flush_log(&self) -> Result<PathBuf, StorageError> {
        let json = self
            .log
            .to_json()
            .map_err(|err| StorageError::OutputDir(err.to_string()))?;
        let path = write_replace(&self.base_path, PROCESSING_LOG_FILENAME, &json)?;
        curator_info!("Processing log saved to: {}", path.display());
        Ok(path)
    }

    pub fn stats(&self) -> StorageStats {
        self.stats
    }

    pub fn log(&self) -> &ProcessingLog {
        &self.log
    }

    fn try_save(
        &self,
        content: &ExtractedContent,
        resource_type: ResourceType,
    ) -> Result<(PathBuf, usize), StorageError> {
        let category_dir = self.base_path.join(resource_type.category());
        ensure_output_dir(&category_dir)?;

        let document = format_document(content, resource_type);
        let path = allocate_and_write(&category_dir, &content.title, &document)?;
        Ok((path, document.len()))
    }

    fn append_entry(
        &mut self,
        url: &str,
        status: ProcessingStatus,
        output_file: Option<&Path>,
        error: Option<&str>,
    ) {
        self.log.append(ProcessingLogEntry {
            url: url.to_string(),
            status,
            processed_at: Utc::now(),
            output_file: output_file.map(Path::to_path_buf),
            error: error.map(str::to_string),
        });
    }
}

/// Write the document under a collision-free name within the category.
///
/// The first taken name gets suffix `-2`, then `-3` and so on. The write
/// itself refuses to clobber, so a name grabbed between the existence probe
/// and the write just advances the counter.
fn allocate_and_write(
    category_dir: &Path,
    title: &str,
    document: &str,
) -> Result<PathBuf, StorageError> {
    let slug = slugify(title);
    let mut counter: usize = 1;

    loop {
        let filename = if counter == 1 {
            format!("{slug}.md")
        } else {
            format!("{slug}-{counter}.md")
        };
        let path = category_dir.join(filename);

        if path.exists() {
            counter += 1;
            continue;
        }

        match write_new(&path, document) {
            Ok(()) => return Ok(path),
            Err(StorageError::Io(err)) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                counter += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Derive a filesystem-safe slug from a title: lower-cased, stripped to
/// word characters/whitespace/hyphens, separator runs collapsed to one
/// hyphen, truncated to 50 characters, `untitled` when nothing survives.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for c in title.to_lowercase().chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            if !slug.is_empty() {
                pending_separator = true;
            }
        } else if c.is_alphanumeric() {
            if pending_separator {
                slug.push('-');
                pending_separator = false;
            }
            slug.push(c);
        }
    }

    if slug.chars().count() > SLUG_MAX_CHARS {
        slug = slug.chars().take(SLUG_MAX_CHARS).collect();
        slug = slug.trim_end_matches('-').to_string();
    }

    if slug.is_empty() {
        slug = "untitled".to_string();
    }
    slug
}

/// Render the durable document: frontmatter header, titled body with
/// description and verbatim content, trailing metadata footer. The field
/// set and order are part of the storage contract.
fn format_document(content: &ExtractedContent, resource_type: ResourceType) -> String {
    let meta = &content.metadata;
    let extracted_at = meta.extracted_at.to_rfc3339();

    format!(
        "---\n\
         title: \"{title}\"\n\
         source: {url}\n\
         type: {resource_type}\n\
         extracted: {extracted_at}\n\
         domain: {domain}\n\
         word_count: {word_count}\n\
         processing_status: completed\n\
         ---\n\
         \n\
         # {title}\n\
         \n\
         ## Description\n\
         {description}\n\
         \n\
         ## Content\n\
         \n\
         {body}\n\
         \n\
         ---\n\
         \n\
         ## Metadata\n\
         \n\
         **Source:** [{url}]({url})\n\
         **Type:** {resource_type}\n\
         **Extracted:** {extracted_at}\n\
         **Extractor:** {extractor}\n\
         **Word Count:** {word_count}\n",
        title = content.title,
        url = meta.url,
        resource_type = resource_type,
        extracted_at = extracted_at,
        domain = meta.domain,
        word_count = meta.word_count,
        description = content.description,
        body = content.content,
        extractor = meta.extractor,
    )
}
