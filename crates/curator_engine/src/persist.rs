use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the output directory exists; create it if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), StorageError> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(StorageError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|err| StorageError::OutputDir(err.to_string()))
}

/// Atomically replace `{dir}/{filename}` by writing a temp file then
/// renaming over the target. Used for the processing log.
pub fn write_replace(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, StorageError> {
    ensure_output_dir(dir)?;

    let target = dir.join(filename);
    let tmp = write_temp(dir, content)?;
    if target.exists() {
        fs::remove_file(&target)?;
    }
    tmp.persist(&target).map_err(|err| StorageError::Io(err.error))?;
    Ok(target)
}

/// Atomically write a new file, failing if the target already exists.
/// Backs the never-overwrite contract for stored documents.
pub fn write_new(path: &Path, content: &str) -> Result<(), StorageError> {
    let dir = path
        .parent()
        .ok_or_else(|| StorageError::OutputDir("document path has no parent".to_string()))?;

    let tmp = write_temp(dir, content)?;
    tmp.persist_noclobber(path)
        .map_err(|err| StorageError::Io(err.error))?;
    Ok(())
}

fn write_temp(dir: &Path, content: &str) -> Result<NamedTempFile, StorageError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    Ok(tmp)
}
