// File system operations for writing stimuli and hashing their contents
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Output directory does not exist: {0}")]
    MissingDirectory(PathBuf),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Check that an output directory exists before anything is written into it
pub fn require_dir(dir: &Path) -> StorageResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(StorageError::MissingDirectory(dir.to_path_buf()))
    }
}

/// Create a directory (and parents) if missing, returning its path
pub fn ensure_dir(dir: &Path) -> StorageResult<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

/// Write data to `path` atomically and return its SHA256 hash
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over the target, so readers never observe a partial file.
pub fn write_atomic(path: &Path, data: &[u8]) -> StorageResult<String> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    require_dir(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(data)?;
    file.flush()?;
    file.persist(path).map_err(|e| StorageError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(calculate_sha256(data))
}

/// Read a file from disk
pub fn read_file(path: &Path) -> StorageResult<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
