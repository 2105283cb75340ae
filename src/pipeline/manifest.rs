// Generation manifest
// Append-only JSONL record of every stimulus written in a session

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::generators::StimulusId;

/// File name of the manifest inside an output directory
pub const MANIFEST_FILE: &str = "manifest.jsonl";

/// Errors that can occur during manifest operations
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A single written stimulus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// ISO 8601 timestamp of when the file was written
    pub timestamp: String,

    /// Generation session that produced the file
    pub session_id: Uuid,

    /// Path of the written file
    pub path: PathBuf,

    /// SHA256 of the file contents
    pub sha256: String,

    /// Parameters the file was generated from
    pub stimulus: StimulusId,

    /// Seed of the session's random generator, when one was used
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub seed: Option<u64>,
}

impl ManifestEntry {
    /// Create a new entry with current timestamp
    pub fn new(session_id: Uuid, path: PathBuf, sha256: String, stimulus: StimulusId) -> Self {
        ManifestEntry {
            timestamp: Utc::now().to_rfc3339(),
            session_id,
            path,
            sha256,
            stimulus,
            seed: None,
        }
    }

    /// Attach the session seed
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Manifest writer
/// Manages append-only JSONL manifest file
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    file_path: PathBuf,
}

impl ManifestWriter {
    /// Create a new manifest writer for a specific file
    pub fn new(file_path: PathBuf) -> Self {
        ManifestWriter { file_path }
    }

    /// Manifest writer for the standard file inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        ManifestWriter::new(dir.join(MANIFEST_FILE))
    }

    /// Append an entry to the file
    /// Creates file if it doesn't exist
    pub fn write(&self, entry: &ManifestEntry) -> Result<(), ManifestError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        let json_line = entry.to_json_line()?;
        file.write_all(json_line.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Get the manifest file path
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Read manifest entries from a JSONL file
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: ManifestEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}
